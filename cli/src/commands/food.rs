use anyhow::{Result, bail};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nibble_core::models::{CustomFood, NewCustomFood, ServingUnit, UnitSystem, UpdateCustomFood};
use nibble_core::units::serving_size_for_display;

use super::helpers::{fmt_mass, not_found, print_json, truncate};
use super::{FoodFields, Service};

const DEFAULT_FOOD_EMOJI: &str = "🍎";

/// The fields given on the command line, still in the user's unit system.
fn food_update(name: Option<String>, fields: &FoodFields) -> Result<UpdateCustomFood> {
    Ok(UpdateCustomFood {
        name,
        emoji: fields.emoji.clone(),
        serving_size: fields.serving.clone(),
        serving_unit: fields
            .unit
            .as_deref()
            .map(str::parse::<ServingUnit>)
            .transpose()?,
        calories: fields.calories,
        protein: fields.protein,
        carbs: fields.carbs,
        fat: fields.fat,
    })
}

fn print_food(food: &CustomFood, units: UnitSystem) {
    println!("{} {}", food.emoji, food.name);
    println!("  ID:       {}", food.id);
    println!(
        "  Serving:  {} ({})",
        serving_size_for_display(&food.serving_size, food.serving_unit, units),
        food.serving_unit
    );
    println!("  Calories: {:.0} kcal", food.calories);
    println!("  Protein:  {}", fmt_mass(food.protein, units));
    println!("  Carbs:    {}", fmt_mass(food.carbs, units));
    println!("  Fat:      {}", fmt_mass(food.fat, units));
    println!("  Log with: nibble log custom_{} <amount>", food.id);
}

pub(crate) fn cmd_food_add(
    svc: &Service,
    name: &str,
    fields: &FoodFields,
    json: bool,
) -> Result<()> {
    if fields.serving.is_none() || fields.calories.is_none() {
        bail!("Please fill in all required fields: --serving and --calories");
    }
    let update = food_update(Some(name.to_string()), fields)?;
    let food = NewCustomFood {
        name: update.name.unwrap_or_default(),
        emoji: update.emoji.unwrap_or_else(|| DEFAULT_FOOD_EMOJI.to_string()),
        serving_size: update.serving_size.unwrap_or_default(),
        serving_unit: update.serving_unit.unwrap_or(ServingUnit::Grams),
        calories: update.calories.unwrap_or_default(),
        protein: update.protein.unwrap_or_default(),
        carbs: update.carbs.unwrap_or_default(),
        fat: update.fat.unwrap_or_default(),
    };
    let saved = svc.add_custom_food(&food)?;

    if json {
        return print_json(&saved);
    }
    println!("Created custom food.\n");
    print_food(&saved, svc.settings().units);
    Ok(())
}

pub(crate) fn cmd_food_list(svc: &Service, search: Option<&str>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct CustomFoodRow {
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
    }

    let needle = search.map(str::to_lowercase);
    let foods: Vec<CustomFood> = svc
        .custom_foods()
        .into_iter()
        .filter(|f| {
            needle
                .as_deref()
                .is_none_or(|n| f.name.to_lowercase().contains(n))
        })
        .collect();

    if json {
        return print_json(&foods);
    }
    if foods.is_empty() {
        eprintln!("No custom foods");
        return Ok(());
    }

    let units = svc.settings().units;
    let rows: Vec<CustomFoodRow> = foods
        .iter()
        .map(|f| CustomFoodRow {
            id: f.id.clone(),
            name: truncate(&format!("{} {}", f.emoji, f.name), 30),
            serving: serving_size_for_display(&f.serving_size, f.serving_unit, units),
            calories: format!("{:.0}", f.calories),
            protein: fmt_mass(f.protein, units),
            carbs: fmt_mass(f.carbs, units),
            fat: fmt_mass(f.fat, units),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(3..)).with(Alignment::right()))
        .to_string();
    println!("{table}");
    Ok(())
}

pub(crate) fn cmd_food_show(svc: &Service, id: &str, json: bool) -> Result<()> {
    let Ok(food) = svc.get_custom_food(id) else {
        not_found(&format!("Custom food {id} not found"), json);
    };
    if json {
        return print_json(&food);
    }
    print_food(&food, svc.settings().units);
    Ok(())
}

pub(crate) fn cmd_food_edit(
    svc: &Service,
    id: &str,
    name: Option<String>,
    fields: &FoodFields,
    json: bool,
) -> Result<()> {
    let update = food_update(name, fields)?;
    if update == UpdateCustomFood::default() {
        bail!("Nothing to update. Provide at least one field to change (see --help)");
    }
    if svc.get_custom_food(id).is_err() {
        not_found(&format!("Custom food {id} not found"), json);
    }
    let saved = svc.edit_custom_food(id, &update)?;

    if json {
        return print_json(&saved);
    }
    println!("Updated custom food.\n");
    print_food(&saved, svc.settings().units);
    Ok(())
}

pub(crate) fn cmd_food_delete(svc: &Service, id: &str, json: bool) -> Result<()> {
    if !svc.delete_custom_food(id)? {
        not_found(&format!("Custom food {id} not found"), json);
    }
    if json {
        print_json(&serde_json::json!({ "deleted": id }))
    } else {
        println!("Deleted custom food {id}");
        Ok(())
    }
}
