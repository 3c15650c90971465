//! Energy and macro targets from body metrics.

use anyhow::Result;
use serde::Serialize;

use crate::models::{
    ActivityLevel, AppData, BmrFormula, Gender, Goal, ProfileData, UnitSystem,
    parse_profile_number,
};
use crate::units::{in_to_cm, lb_to_kg};

/// Calories per gram.
pub const PROTEIN_KCAL_PER_G: f64 = 4.0;
pub const CARBS_KCAL_PER_G: f64 = 4.0;
pub const FAT_KCAL_PER_G: f64 = 9.0;

/// Share of daily calories per macro.
pub const PROTEIN_SHARE: f64 = 0.30;
pub const CARBS_SHARE: f64 = 0.40;
pub const FAT_SHARE: f64 = 0.30;

pub const GOAL_ADJUSTMENT_KCAL: i64 = 500;

/// Nearest integer with halves rounded toward +infinity (2.5 -> 3, -2.5 -> -2).
#[must_use]
pub fn round_half_up(value: f64) -> f64 {
    // Not `(value + 0.5).floor()`: the addition rounds 0.49999999999999994 up to 1.
    let floor = value.floor();
    if value - floor >= 0.5 { floor + 1.0 } else { floor }
}

#[must_use]
pub fn round_to_tenth(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i64(value: f64) -> i64 {
    round_half_up(value) as i64
}

/// Body metrics in metric units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodyMetrics {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age_years: f64,
    pub gender: Gender,
}

impl BodyMetrics {
    /// Parse profile strings, converting from imperial when needed.
    pub fn from_profile(profile: &ProfileData, units: UnitSystem) -> Result<Self> {
        let weight = parse_profile_number("weight", &profile.weight)?;
        let height = parse_profile_number("height", &profile.height)?;
        let age = parse_profile_number("age", &profile.age)?;
        let (weight_kg, height_cm) = match units {
            UnitSystem::Metric => (weight, height),
            UnitSystem::Imperial => (lb_to_kg(weight), in_to_cm(height)),
        };
        Ok(Self {
            weight_kg,
            height_cm,
            age_years: age,
            gender: profile.gender,
        })
    }
}

/// Boer-style lean body mass estimate, gender independent.
///
/// Katch-McArdle and Cunningham are defined over measured lean mass; this
/// estimate stands in for it since the profile carries no body-fat figure.
#[must_use]
pub fn boer_lean_body_mass(weight_kg: f64, height_cm: f64) -> f64 {
    0.407 * weight_kg + 0.267 * height_cm - 19.2
}

#[must_use]
pub fn bmr(metrics: &BodyMetrics, formula: BmrFormula) -> f64 {
    let BodyMetrics {
        weight_kg: w,
        height_cm: h,
        age_years: a,
        gender,
    } = *metrics;

    match formula {
        BmrFormula::MifflinStJeor => {
            let base = 10.0 * w + 6.25 * h - 5.0 * a;
            match gender {
                Gender::Male => base + 5.0,
                Gender::Female => base - 161.0,
            }
        }
        BmrFormula::HarrisBenedict => match gender {
            Gender::Male => 88.362 + 13.397 * w + 4.799 * h - 5.677 * a,
            Gender::Female => 447.593 + 9.247 * w + 3.098 * h - 4.330 * a,
        },
        BmrFormula::KatchMcArdle => 370.0 + 21.6 * boer_lean_body_mass(w, h),
        BmrFormula::Cunningham => 500.0 + 22.0 * boer_lean_body_mass(w, h),
    }
}

#[must_use]
pub fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::LightlyActive => 1.375,
        ActivityLevel::ModeratelyActive => 1.55,
        ActivityLevel::VeryActive => 1.725,
        ActivityLevel::ExtremelyActive => 1.9,
    }
}

#[must_use]
pub fn tdee(bmr: f64, level: ActivityLevel) -> i64 {
    round_to_i64(bmr * activity_multiplier(level))
}

#[must_use]
pub fn daily_calories(tdee: i64, goal: Goal) -> i64 {
    match goal {
        Goal::LoseWeight => tdee - GOAL_ADJUSTMENT_KCAL,
        Goal::MaintainWeight => tdee,
        Goal::GainWeight => tdee + GOAL_ADJUSTMENT_KCAL,
    }
}

/// Daily macro targets in grams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroTargets {
    pub protein_g: i64,
    pub carbs_g: i64,
    pub fat_g: i64,
}

#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn macro_targets(daily_calories: i64) -> MacroTargets {
    let cal = daily_calories as f64;
    MacroTargets {
        protein_g: round_to_i64(cal * PROTEIN_SHARE / PROTEIN_KCAL_PER_G),
        carbs_g: round_to_i64(cal * CARBS_SHARE / CARBS_KCAL_PER_G),
        fat_g: round_to_i64(cal * FAT_SHARE / FAT_KCAL_PER_G),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NutritionPlan {
    pub formula: BmrFormula,
    pub metrics: BodyMetrics,
    pub bmr: f64,
    pub tdee: i64,
    pub daily_calories: i64,
    pub macros: MacroTargets,
}

/// Full plan from the stored profile and settings.
pub fn nutrition_plan(profile: &ProfileData, app: &AppData) -> Result<NutritionPlan> {
    let metrics = BodyMetrics::from_profile(profile, app.units)?;
    let bmr = bmr(&metrics, app.tdee);
    let tdee = tdee(bmr, profile.activity);
    let daily_calories = daily_calories(tdee, profile.goal);
    Ok(NutritionPlan {
        formula: app.tdee,
        metrics,
        bmr,
        tdee,
        daily_calories,
        macros: macro_targets(daily_calories),
    })
}
