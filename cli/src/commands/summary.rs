use anyhow::Result;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use nibble_core::models::{Totals, UnitSystem};

use super::Service;
use super::helpers::{fmt_mass, no_neg_zero, parse_date, print_json};
use super::log::describe_entry;

fn totals_line(label: &str, t: &Totals, units: UnitSystem) -> String {
    format!(
        "  {label}: {:.0} kcal | P:{} C:{} F:{}",
        no_neg_zero(t.calories),
        fmt_mass(t.protein, units),
        fmt_mass(t.carbs, units),
        fmt_mass(t.fat, units),
    )
}

pub(crate) fn cmd_summary(svc: &Service, date: Option<String>, json: bool) -> Result<()> {
    let date = parse_date(date)?;
    let summary = svc.day_summary(date);

    if json {
        return print_json(&summary);
    }

    let units = summary.units;
    println!("=== {} ===\n", summary.date);

    for meal in &summary.meals {
        let label = meal.meal_type.label().to_uppercase();
        println!("  {label} ({:.0} kcal)", meal.totals.calories);
        if meal.entries.is_empty() {
            println!("    (nothing logged)");
        }
        for e in &meal.entries {
            println!("    {}", describe_entry(e, units));
        }
        println!();
    }

    println!("{}", totals_line("TOTAL", &summary.totals, units));

    if let Some(plan) = &summary.goal {
        #[allow(clippy::cast_precision_loss)]
        let goal = Totals {
            calories: plan.daily_calories as f64,
            protein: plan.macros.protein_g as f64,
            carbs: plan.macros.carbs_g as f64,
            fat: plan.macros.fat_g as f64,
        };
        println!("{}", totals_line("GOAL", &goal, units));
    }
    if let Some(remaining) = &summary.remaining {
        println!("{}", totals_line("REMAINING", remaining, units));
    }

    Ok(())
}

pub(crate) fn cmd_week(svc: &Service, date: Option<String>, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct DayRow {
        #[tabled(rename = "Day")]
        day: String,
        #[tabled(rename = "Date")]
        date: String,
        #[tabled(rename = "Calories")]
        calories: String,
        #[tabled(rename = "Goal")]
        goal: String,
    }

    let date = parse_date(date)?;
    let week = svc.weekly_summary(date);

    if json {
        return print_json(&week);
    }

    let rows: Vec<DayRow> = week
        .days
        .iter()
        .map(|d| DayRow {
            day: d.day.to_string(),
            date: d.date.clone(),
            calories: format!("{:.0}", no_neg_zero(d.calories)),
            goal: d.goal.map_or_else(|| "-".to_string(), |g| g.to_string()),
        })
        .collect();

    println!("Week of {}\n", week.week_start);
    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let total = week.total_calories;
    let avg = week.average_calories;
    let logged = week.days_logged;
    println!("\n  Total: {total:.0} kcal | Days logged: {logged} | Average: {avg:.0} kcal/day");
    Ok(())
}
