use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::process;

use nibble_core::models::UnitSystem;
use nibble_core::units::{display_mass, mass_unit_label};

pub(crate) fn parse_date(date_str: Option<String>) -> Result<NaiveDate> {
    match date_str {
        None => Ok(Local::now().date_naive()),
        Some(s) => match s.as_str() {
            "today" => Ok(Local::now().date_naive()),
            "yesterday" => Ok(Local::now().date_naive() - chrono::Duration::days(1)),
            "tomorrow" => Ok(Local::now().date_naive() + chrono::Duration::days(1)),
            _ => NaiveDate::parse_from_str(&s, "%Y-%m-%d").with_context(|| {
                format!("Invalid date '{s}'. Use YYYY-MM-DD or today/yesterday/tomorrow")
            }),
        },
    }
}

/// Parse a preset food argument of the form `ID:AMOUNT`.
pub(crate) fn parse_food_amount(s: &str) -> Result<(String, f64)> {
    let Some((id, amount)) = s.rsplit_once(':') else {
        bail!("Invalid food '{s}'. Use 'ID:AMOUNT' (e.g. '2:150')");
    };
    let id = id.trim();
    if id.is_empty() {
        bail!("Invalid food '{s}'. Missing food ID");
    }
    let amount: f64 = amount
        .trim()
        .parse()
        .with_context(|| format!("Invalid amount in '{s}'"))?;
    Ok((id.to_string(), amount))
}

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Report a missing record and exit with status 2.
pub(crate) fn not_found(message: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(message));
    } else {
        eprintln!("{message}");
    }
    process::exit(2);
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

/// Macro grams in the user's unit system, e.g. `12g` or `0.4oz`.
pub(crate) fn fmt_mass(grams: f64, units: UnitSystem) -> String {
    let m = display_mass(no_neg_zero(grams), units);
    match units {
        UnitSystem::Metric => format!("{:.0}{}", m.value, mass_unit_label(units)),
        UnitSystem::Imperial => format!("{:.1}{}", m.value, mass_unit_label(units)),
    }
}

pub(crate) fn no_neg_zero(v: f64) -> f64 {
    if v == 0.0 { 0.0 } else { v }
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}
