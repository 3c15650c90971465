use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nibble_core::models::{MealPreset, MealPresetFood, UnitSystem};
use nibble_core::nutrition::{round_half_up, round_to_tenth};
use nibble_core::units::serving_size_for_display;

use super::Service;
use super::helpers::{fmt_mass, not_found, parse_food_amount, print_json, truncate};

fn print_preset(preset: &MealPreset, units: UnitSystem) {
    #[derive(Tabled)]
    struct PresetFoodRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Food")]
        name: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Servings")]
        servings: String,
        #[tabled(rename = "Cal")]
        calories: String,
    }

    println!("{} {}", preset.emoji, preset.name);
    if !preset.description.is_empty() {
        println!("  {}", preset.description);
    }
    println!("  ID: {}\n", preset.id);

    let rows: Vec<PresetFoodRow> = preset
        .foods
        .iter()
        .map(|f| PresetFoodRow {
            id: f.id.clone(),
            name: truncate(&food_label(f), 30),
            serving: serving_size_for_display(&f.serving_size, f.serving_unit, units),
            servings: format!("{}", round_to_tenth(f.servings)),
            calories: format!("{:.0}", round_half_up(f.calories_per_serving * f.servings)),
        })
        .collect();
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    println!(
        "\n  TOTAL: {:.0} kcal | P:{} C:{} F:{}",
        preset.total_calories,
        fmt_mass(preset.total_protein, units),
        fmt_mass(preset.total_carbs, units),
        fmt_mass(preset.total_fat, units),
    );
}

fn food_label(food: &MealPresetFood) -> String {
    match food.emoji {
        Some(ref e) => format!("{e} {}", food.name),
        None => food.name.clone(),
    }
}

pub(crate) fn cmd_preset_create(
    svc: &Service,
    name: &str,
    foods: &[String],
    description: &str,
    emoji: &str,
    json: bool,
) -> Result<()> {
    let mut picked = Vec::with_capacity(foods.len());
    for arg in foods {
        let (food_id, amount) = parse_food_amount(arg)?;
        if svc.find_food(&food_id).is_err() {
            not_found(&format!("Food {food_id} not found"), json);
        }
        picked.push(svc.preset_food(&food_id, amount)?);
    }

    let preset = svc.create_meal_preset(name, description, emoji, picked)?;
    if json {
        return print_json(&preset);
    }
    println!("Created meal preset.\n");
    print_preset(&preset, svc.settings().units);
    Ok(())
}

pub(crate) fn cmd_preset_list(svc: &Service, search: Option<&str>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct PresetRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Foods")]
        foods: usize,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
    }

    let presets = match search {
        Some(q) => svc.find_presets(q),
        None => svc.meal_presets(),
    };
    if json {
        return print_json(&presets);
    }
    if presets.is_empty() {
        eprintln!("No meal presets");
        return Ok(());
    }

    let units = svc.settings().units;
    let rows: Vec<PresetRow> = presets
        .iter()
        .map(|p| PresetRow {
            id: p.id.clone(),
            name: truncate(&format!("{} {}", p.emoji, p.name), 30),
            foods: p.foods.len(),
            calories: format!("{:.0}", p.total_calories),
            protein: fmt_mass(p.total_protein, units),
            carbs: fmt_mass(p.total_carbs, units),
            fat: fmt_mass(p.total_fat, units),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_preset_show(svc: &Service, id: &str, json: bool) -> Result<()> {
    let Ok(preset) = svc.get_meal_preset(id) else {
        not_found(&format!("Meal preset {id} not found"), json);
    };
    if json {
        return print_json(&preset);
    }
    print_preset(&preset, svc.settings().units);
    Ok(())
}

pub(crate) fn cmd_preset_servings(
    svc: &Service,
    preset_id: &str,
    food_id: &str,
    servings: f64,
    json: bool,
) -> Result<()> {
    if svc.get_meal_preset(preset_id).is_err() {
        not_found(&format!("Meal preset {preset_id} not found"), json);
    }
    let preset = svc.set_preset_food_servings(preset_id, food_id, servings)?;
    if json {
        return print_json(&preset);
    }
    print_preset(&preset, svc.settings().units);
    Ok(())
}

pub(crate) fn cmd_preset_remove_food(
    svc: &Service,
    preset_id: &str,
    food_id: &str,
    json: bool,
) -> Result<()> {
    if svc.get_meal_preset(preset_id).is_err() {
        not_found(&format!("Meal preset {preset_id} not found"), json);
    }
    let preset = svc.remove_preset_food(preset_id, food_id)?;
    if json {
        return print_json(&preset);
    }
    print_preset(&preset, svc.settings().units);
    Ok(())
}

pub(crate) fn cmd_preset_delete(svc: &Service, id: &str, json: bool) -> Result<()> {
    if !svc.delete_meal_preset(id)? {
        not_found(&format!("Meal preset {id} not found"), json);
    }
    if json {
        print_json(&serde_json::json!({ "deleted": id }))
    } else {
        println!("Deleted meal preset {id}");
        Ok(())
    }
}
