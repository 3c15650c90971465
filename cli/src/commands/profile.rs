use anyhow::{Result, bail};

use nibble_core::models::{
    ActivityLevel, AppData, BmrFormula, Gender, Goal, ProfileData, UnitSystem,
};
use nibble_core::units::{grams_to_ounces, height_unit_label, weight_unit_label};

use super::helpers::print_json;
use super::{ProfileFields, Service};

/// Overlay the given fields on `base`.
pub(crate) fn apply_profile_fields(
    base: ProfileData,
    fields: &ProfileFields,
) -> Result<ProfileData> {
    let mut profile = base;
    if let Some(ref g) = fields.gender {
        profile.gender = g.parse::<Gender>()?;
    }
    if let Some(ref a) = fields.activity {
        profile.activity = a.parse::<ActivityLevel>()?;
    }
    if let Some(ref g) = fields.goal {
        profile.goal = g.parse::<Goal>()?;
    }
    if let Some(ref w) = fields.weight {
        profile.weight = w.trim().to_string();
    }
    if let Some(ref h) = fields.height {
        profile.height = h.trim().to_string();
    }
    if let Some(ref a) = fields.age {
        profile.age = a.trim().to_string();
    }
    Ok(profile)
}

fn with_unit(value: &str, unit: &str) -> String {
    format!("{value} {unit}")
}

fn print_profile(profile: &ProfileData, app: &AppData) {
    println!("Gender:    {}", profile.gender);
    println!("Age:       {}", profile.age);
    println!("Weight:    {}", with_unit(&profile.weight, weight_unit_label(app.units)));
    println!("Height:    {}", with_unit(&profile.height, height_unit_label(app.units)));
    println!("Activity:  {}", profile.activity);
    println!("Goal:      {}", profile.goal);
}

pub(crate) fn cmd_setup(
    svc: &Service,
    fields: &ProfileFields,
    units: &str,
    json: bool,
) -> Result<()> {
    if fields.weight.is_none() || fields.height.is_none() || fields.age.is_none() {
        bail!("Missing information. --weight, --height and --age are required");
    }
    let units: UnitSystem = units.parse()?;
    let profile = apply_profile_fields(ProfileData::default(), fields)?;
    svc.complete_setup(&profile, units)?;

    if json {
        let plan = svc.nutrition_plan()?;
        print_json(&serde_json::json!({
            "profile": profile,
            "settings": svc.settings(),
            "plan": plan,
        }))
    } else {
        println!("Setup complete.\n");
        print_profile(&profile, &svc.settings());
        println!();
        cmd_plan(svc, false)
    }
}

pub(crate) fn cmd_profile_show(svc: &Service, json: bool) -> Result<()> {
    let profile = svc.profile();
    if json {
        return print_json(&profile);
    }
    if !svc.is_setup_complete() {
        eprintln!("Setup not complete yet, showing defaults. Run `nibble setup`.\n");
    }
    print_profile(&profile, &svc.settings());
    Ok(())
}

pub(crate) fn cmd_profile_set(svc: &Service, fields: &ProfileFields, json: bool) -> Result<()> {
    let profile = apply_profile_fields(svc.profile(), fields)?;
    svc.update_profile(&profile)?;
    if json {
        print_json(&profile)
    } else {
        println!("Profile updated.\n");
        print_profile(&profile, &svc.settings());
        Ok(())
    }
}

pub(crate) fn cmd_settings_show(svc: &Service, json: bool) -> Result<()> {
    let app = svc.settings();
    if json {
        return print_json(&app);
    }
    println!("Units:    {}", app.units);
    println!("Formula:  {}", app.tdee);
    Ok(())
}

pub(crate) fn cmd_settings_set(
    svc: &Service,
    units: Option<&str>,
    formula: Option<&str>,
    json: bool,
) -> Result<()> {
    if units.is_none() && formula.is_none() {
        bail!("Nothing to update. Provide --units and/or --formula");
    }
    let formula = formula.map(str::parse::<BmrFormula>).transpose()?;
    let units = units.map(str::parse::<UnitSystem>).transpose()?;

    if let Some(units) = units {
        let profile = svc.change_units(units)?;
        if !json {
            println!(
                "Units set to {units}. Weight {}, height {}",
                with_unit(&profile.weight, weight_unit_label(units)),
                with_unit(&profile.height, height_unit_label(units))
            );
        }
    }
    if let Some(formula) = formula {
        svc.set_formula(formula)?;
        if !json {
            println!("Formula set to {formula}");
        }
    }

    if json {
        print_json(&svc.settings())?;
    }
    Ok(())
}

pub(crate) fn cmd_plan(svc: &Service, json: bool) -> Result<()> {
    let plan = svc.nutrition_plan()?;
    if json {
        return print_json(&plan);
    }

    let units = svc.settings().units;
    let bmr = plan.bmr;
    let tdee = plan.tdee;
    let cal = plan.daily_calories;
    println!("Formula:        {}", plan.formula);
    println!("BMR:            {bmr:.0} kcal");
    println!("TDEE:           {tdee} kcal");
    println!("Daily goal:     {cal} kcal");

    #[allow(clippy::cast_precision_loss)]
    let macro_line = |label: &str, grams: i64| match units {
        UnitSystem::Metric => println!("{label:<16}{grams}g"),
        UnitSystem::Imperial => println!("{label:<16}{}oz", grams_to_ounces(grams as f64)),
    };
    macro_line("Protein:", plan.macros.protein_g);
    macro_line("Carbs:", plan.macros.carbs_g);
    macro_line("Fat:", plan.macros.fat_g);
    Ok(())
}
