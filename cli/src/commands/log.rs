use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nibble_core::models::{DailyMealEntry, MealType, ServingUnit, UnitSystem, UpdateMealEntry};
use nibble_core::units::{display_amount, serving_size_for_display, serving_unit_label};

use super::Service;
use super::helpers::{fmt_mass, not_found, parse_date, print_json, truncate};

/// Stored amount as the user reads it, e.g. `150g`, `5.3oz`, `2 units`.
pub(crate) fn fmt_amount(amount: f64, unit: ServingUnit, units: UnitSystem) -> String {
    let shown = display_amount(amount, unit, units);
    let label = serving_unit_label(unit, units);
    match unit {
        ServingUnit::Units => format!("{shown} {label}"),
        _ if shown.fract() == 0.0 => format!("{shown:.0}{label}"),
        _ => format!("{shown}{label}"),
    }
}

pub(crate) fn describe_entry(e: &DailyMealEntry, units: UnitSystem) -> String {
    let emoji = e.emoji.as_deref().map(|s| format!("{s} ")).unwrap_or_default();
    format!(
        "[{}] {emoji}{} {} | {:.0} kcal | P:{} C:{} F:{}",
        e.id,
        e.food_name,
        fmt_amount(e.amount, e.serving_unit, units),
        e.calories,
        fmt_mass(e.protein, units),
        fmt_mass(e.carbs, units),
        fmt_mass(e.fat, units),
    )
}

pub(crate) fn cmd_search(svc: &Service, query: Option<&str>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct FoodRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Serving")]
        serving: String,
        #[tabled(rename = "Cal")]
        calories: String,
        #[tabled(rename = "Protein")]
        protein: String,
        #[tabled(rename = "Carbs")]
        carbs: String,
        #[tabled(rename = "Fat")]
        fat: String,
        #[tabled(rename = "Category")]
        category: String,
    }

    let foods = svc.search_foods(query.unwrap_or(""));
    if json {
        return print_json(&foods);
    }
    if foods.is_empty() {
        not_found(
            &format!("No foods match '{}'", query.unwrap_or_default()),
            false,
        );
    }

    let units = svc.settings().units;
    let rows: Vec<FoodRow> = foods
        .iter()
        .map(|f| FoodRow {
            id: f.id.clone(),
            name: truncate(&f.name, 30),
            serving: serving_size_for_display(&f.serving_size, f.serving_unit, units),
            calories: format!("{:.0}", f.calories_per_serving),
            protein: fmt_mass(f.protein, units),
            carbs: fmt_mass(f.carbs, units),
            fat: fmt_mass(f.fat, units),
            category: f.category.clone(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..7)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_log(
    svc: &Service,
    food_id: &str,
    amount: f64,
    meal: &str,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    let meal_type: MealType = meal.parse()?;
    let date = parse_date(date)?;
    if svc.find_food(food_id).is_err() {
        not_found(&format!("Food {food_id} not found"), json);
    }

    let entry = svc.log_food(food_id, meal_type, amount, date)?;
    if json {
        return print_json(&entry);
    }
    let units = svc.settings().units;
    println!(
        "Logged: {} {} for {} on {} ({:.0} kcal)",
        entry.food_name,
        fmt_amount(entry.amount, entry.serving_unit, units),
        entry.meal_type,
        entry.date,
        entry.calories
    );
    Ok(())
}

pub(crate) fn cmd_edit(
    svc: &Service,
    entry_id: &str,
    amount: Option<f64>,
    meal: Option<&str>,
    date: Option<String>,
    json: bool,
) -> Result<()> {
    if amount.is_none() && meal.is_none() && date.is_none() {
        bail!("Nothing to update. Provide --amount, --meal and/or --date");
    }
    if svc.get_entry(entry_id).is_err() {
        not_found(&format!("Entry {entry_id} not found"), json);
    }

    let meal_type = meal.map(str::parse::<MealType>).transpose()?;
    let date = date.map(|d| parse_date(Some(d))).transpose()?;

    let mut entry = match amount {
        Some(a) => svc.edit_entry_amount(entry_id, a)?,
        None => svc.get_entry(entry_id)?,
    };
    if meal_type.is_some() || date.is_some() {
        entry = svc.update_entry(
            entry_id,
            &UpdateMealEntry {
                meal_type,
                date,
                ..UpdateMealEntry::default()
            },
        )?;
    }

    if json {
        return print_json(&entry);
    }
    let units = svc.settings().units;
    println!("Updated: {}", describe_entry(&entry, units));
    Ok(())
}

pub(crate) fn cmd_delete(svc: &Service, entry_id: &str, json: bool) -> Result<()> {
    if !svc.delete_entry(entry_id)? {
        not_found(&format!("Entry {entry_id} not found"), json);
    }
    if json {
        print_json(&serde_json::json!({ "deleted": entry_id }))
    } else {
        println!("Deleted entry {entry_id}");
        Ok(())
    }
}
