//! Metric/imperial conversion. Grams, kilograms and centimeters are canonical;
//! imperial values only exist at the input and display edges.

use anyhow::{Result, bail};

use crate::models::{ProfileData, ServingUnit, UnitSystem};
use crate::nutrition::round_to_tenth;

pub const LBS_PER_KG: f64 = 2.20462;
pub const CM_PER_INCH: f64 = 2.54;
pub const GRAMS_PER_OUNCE: f64 = 28.3495;

#[must_use]
pub fn kg_to_lb(kg: f64) -> f64 {
    kg * LBS_PER_KG
}

#[must_use]
pub fn lb_to_kg(lb: f64) -> f64 {
    lb / LBS_PER_KG
}

#[must_use]
pub fn cm_to_in(cm: f64) -> f64 {
    cm / CM_PER_INCH
}

#[must_use]
pub fn in_to_cm(inches: f64) -> f64 {
    inches * CM_PER_INCH
}

/// Grams to ounces, rounded to one decimal.
#[must_use]
pub fn grams_to_ounces(grams: f64) -> f64 {
    round_to_tenth(grams / GRAMS_PER_OUNCE)
}

#[must_use]
pub fn ounces_to_grams(ounces: f64) -> f64 {
    ounces * GRAMS_PER_OUNCE
}

/// Render with exactly one decimal, halves rounded up.
#[must_use]
pub fn format_one_decimal(value: f64) -> String {
    format!("{:.1}", round_to_tenth(value))
}

/// Convert a profile's weight and height between unit systems.
///
/// Values are rewritten with one decimal. Fields that do not parse as numbers
/// are left as they are, and converting to the same system is a no-op.
#[must_use]
pub fn convert_profile(profile: &ProfileData, from: UnitSystem, to: UnitSystem) -> ProfileData {
    let mut out = profile.clone();
    if from == to {
        return out;
    }

    let (weight_fn, height_fn): (fn(f64) -> f64, fn(f64) -> f64) = match to {
        UnitSystem::Imperial => (kg_to_lb, cm_to_in),
        UnitSystem::Metric => (lb_to_kg, in_to_cm),
    };

    if let Ok(w) = profile.weight.trim().parse::<f64>() {
        out.weight = format_one_decimal(weight_fn(w));
    }
    if let Ok(h) = profile.height.trim().parse::<f64>() {
        out.height = format_one_decimal(height_fn(h));
    }
    out
}

#[must_use]
pub fn mass_unit_label(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "g",
        UnitSystem::Imperial => "oz",
    }
}

#[must_use]
pub fn weight_unit_label(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "kg",
        UnitSystem::Imperial => "lbs",
    }
}

#[must_use]
pub fn height_unit_label(units: UnitSystem) -> &'static str {
    match units {
        UnitSystem::Metric => "cm",
        UnitSystem::Imperial => "in",
    }
}

/// Label for a serving amount in the given system. Only gram servings
/// switch to ounces.
#[must_use]
pub fn serving_unit_label(unit: ServingUnit, units: UnitSystem) -> &'static str {
    match unit {
        ServingUnit::Grams => mass_unit_label(units),
        ServingUnit::Ml => "ml",
        ServingUnit::Units => "units",
    }
}

/// A mass converted for display, e.g. `4.2 oz`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassDisplay {
    pub value: f64,
    pub unit: &'static str,
}

impl std::fmt::Display for MassDisplay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.unit == "oz" {
            write!(f, "{:.1} {}", self.value, self.unit)
        } else {
            write!(f, "{} {}", self.value, self.unit)
        }
    }
}

#[must_use]
pub fn display_mass(grams: f64, units: UnitSystem) -> MassDisplay {
    match units {
        UnitSystem::Metric => MassDisplay {
            value: grams,
            unit: "g",
        },
        UnitSystem::Imperial => MassDisplay {
            value: grams_to_ounces(grams),
            unit: "oz",
        },
    }
}

/// Stored serving amount to the amount shown to the user.
#[must_use]
pub fn display_amount(amount: f64, unit: ServingUnit, units: UnitSystem) -> f64 {
    match (unit, units) {
        (ServingUnit::Grams, UnitSystem::Imperial) => grams_to_ounces(amount),
        _ => amount,
    }
}

/// Amount typed by the user to the amount stored. Inverse of [`display_amount`].
#[must_use]
pub fn amount_to_storage(amount: f64, unit: ServingUnit, units: UnitSystem) -> f64 {
    match (unit, units) {
        (ServingUnit::Grams, UnitSystem::Imperial) => ounces_to_grams(amount),
        _ => amount,
    }
}

/// Macro grams typed in the current system to stored grams. Ounce input is
/// converted and kept to one decimal.
#[must_use]
pub fn macro_to_storage(value: f64, units: UnitSystem) -> f64 {
    match units {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => round_to_tenth(ounces_to_grams(value)),
    }
}

/// Serving size label typed in the current system to the stored label.
/// Only numeric gram sizes entered in ounces are rewritten.
#[must_use]
pub fn serving_size_to_storage(size: &str, unit: ServingUnit, units: UnitSystem) -> String {
    if unit != ServingUnit::Grams || units == UnitSystem::Metric {
        return size.to_string();
    }
    match size.trim().parse::<f64>() {
        Ok(oz) => format_one_decimal(ounces_to_grams(oz)),
        Err(_) => size.to_string(),
    }
}

/// Serving size label for display, e.g. `"100g"` -> `"3.5 oz"` in imperial.
#[must_use]
pub fn serving_size_for_display(size: &str, unit: ServingUnit, units: UnitSystem) -> String {
    if unit != ServingUnit::Grams || units == UnitSystem::Metric {
        return size.to_string();
    }
    match leading_number(size) {
        Some(grams) if grams > 0.0 => format!("{} oz", grams_to_ounces(grams)),
        _ => size.to_string(),
    }
}

/// Leading number of a serving size label: `"100g"` -> 100, `"1.5 cups"` -> 1.5.
fn leading_number(serving_size: &str) -> Option<f64> {
    let start = serving_size.find(|c: char| c.is_ascii_digit())?;
    let rest = &serving_size[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(rest.len());
    rest[..end].trim_end_matches('.').parse().ok()
}

/// How many servings `amount` represents.
///
/// Gram and ml foods are defined per `serving_size` (e.g. per "100g"), so the
/// multiplier is `amount / 100`. Unit foods count servings directly.
pub fn serving_multiplier(serving_size: &str, unit: ServingUnit, amount: f64) -> Result<f64> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Amount must be greater than 0");
    }
    match unit {
        ServingUnit::Units => Ok(amount),
        ServingUnit::Grams | ServingUnit::Ml => match leading_number(serving_size) {
            Some(size) if size > 0.0 => Ok(amount / size),
            _ => bail!("Serving size '{serving_size}' has no usable number"),
        },
    }
}
