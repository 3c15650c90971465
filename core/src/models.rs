use std::fmt;
use std::str::FromStr;

use anyhow::{Result, bail};
use chrono::{NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// --- Choice enums ---
//
// Serialized values match the strings persisted by the mobile app, so existing
// backups and stores decode unchanged.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivityLevel {
    Sedentary,
    #[serde(rename = "Lightly Active")]
    LightlyActive,
    #[default]
    #[serde(rename = "Moderately Active")]
    ModeratelyActive,
    #[serde(rename = "Very Active")]
    VeryActive,
    #[serde(rename = "Extremely Active")]
    ExtremelyActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Goal {
    #[default]
    #[serde(rename = "Lose Weight")]
    LoseWeight,
    #[serde(rename = "Maintain Weight")]
    MaintainWeight,
    #[serde(rename = "Gain Weight")]
    GainWeight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    #[default]
    Metric,
    Imperial,
}

/// Equation used to estimate basal metabolic rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BmrFormula {
    #[default]
    #[serde(rename = "Mifflin-St Jeor")]
    MifflinStJeor,
    #[serde(rename = "Harris-Benedict")]
    HarrisBenedict,
    #[serde(rename = "Katch-McArdle")]
    KatchMcArdle,
    Cunningham,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snacks,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServingUnit {
    Grams,
    Ml,
    Units,
}

impl Gender {
    pub const ALL: &'static [Self] = &[Self::Male, Self::Female];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl ActivityLevel {
    pub const ALL: &'static [Self] = &[
        Self::Sedentary,
        Self::LightlyActive,
        Self::ModeratelyActive,
        Self::VeryActive,
        Self::ExtremelyActive,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Sedentary => "Sedentary",
            Self::LightlyActive => "Lightly Active",
            Self::ModeratelyActive => "Moderately Active",
            Self::VeryActive => "Very Active",
            Self::ExtremelyActive => "Extremely Active",
        }
    }
}

impl Goal {
    pub const ALL: &'static [Self] = &[Self::LoseWeight, Self::MaintainWeight, Self::GainWeight];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::LoseWeight => "Lose Weight",
            Self::MaintainWeight => "Maintain Weight",
            Self::GainWeight => "Gain Weight",
        }
    }
}

impl UnitSystem {
    pub const ALL: &'static [Self] = &[Self::Metric, Self::Imperial];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Metric => "Metric",
            Self::Imperial => "Imperial",
        }
    }
}

impl BmrFormula {
    pub const ALL: &'static [Self] = &[
        Self::MifflinStJeor,
        Self::HarrisBenedict,
        Self::KatchMcArdle,
        Self::Cunningham,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::MifflinStJeor => "Mifflin-St Jeor",
            Self::HarrisBenedict => "Harris-Benedict",
            Self::KatchMcArdle => "Katch-McArdle",
            Self::Cunningham => "Cunningham",
        }
    }
}

impl MealType {
    pub const ALL: &'static [Self] = &[Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snacks];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snacks => "snacks",
        }
    }
}

impl ServingUnit {
    pub const ALL: &'static [Self] = &[Self::Grams, Self::Ml, Self::Units];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Grams => "grams",
            Self::Ml => "ml",
            Self::Units => "units",
        }
    }
}

/// Normalize user input for choice matching: lowercase, with spaces,
/// hyphens and underscores removed ("moderately-active" == "Moderately Active").
fn normalize_choice(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_choice<T: Copy>(
    input: &str,
    all: &[T],
    label: fn(T) -> &'static str,
    kind: &str,
) -> Result<T> {
    let wanted = normalize_choice(input);
    if let Some(found) = all
        .iter()
        .copied()
        .find(|c| normalize_choice(label(*c)) == wanted)
    {
        return Ok(found);
    }
    let options: Vec<&str> = all.iter().map(|c| label(*c)).collect();
    bail!("Invalid {kind} '{input}'. Must be one of: {}", options.join(", "))
}

impl FromStr for Gender {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_choice(s).as_str() {
            "m" => Ok(Self::Male),
            "f" => Ok(Self::Female),
            _ => parse_choice(s, Self::ALL, Self::label, "gender"),
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_choice(s).as_str() {
            "lightly" | "light" => Ok(Self::LightlyActive),
            "moderately" | "moderate" => Ok(Self::ModeratelyActive),
            "very" => Ok(Self::VeryActive),
            "extremely" | "extreme" => Ok(Self::ExtremelyActive),
            _ => parse_choice(s, Self::ALL, Self::label, "activity level"),
        }
    }
}

impl FromStr for Goal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_choice(s).as_str() {
            "lose" => Ok(Self::LoseWeight),
            "maintain" => Ok(Self::MaintainWeight),
            "gain" => Ok(Self::GainWeight),
            _ => parse_choice(s, Self::ALL, Self::label, "goal"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_choice(s, Self::ALL, Self::label, "unit system")
    }
}

impl FromStr for BmrFormula {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_choice(s).as_str() {
            "mifflin" => Ok(Self::MifflinStJeor),
            "harris" => Ok(Self::HarrisBenedict),
            "katch" => Ok(Self::KatchMcArdle),
            _ => parse_choice(s, Self::ALL, Self::label, "BMR formula"),
        }
    }
}

impl FromStr for MealType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        validate_meal_type(s)
    }
}

impl FromStr for ServingUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match normalize_choice(s).as_str() {
            "g" | "gram" => Ok(Self::Grams),
            "milliliters" | "millilitres" => Ok(Self::Ml),
            "unit" | "piece" | "pieces" => Ok(Self::Units),
            _ => parse_choice(s, Self::ALL, Self::label, "serving unit"),
        }
    }
}

macro_rules! display_via_label {
    ($($t:ty),*) => {
        $(impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        })*
    };
}

display_via_label!(Gender, ActivityLevel, Goal, UnitSystem, BmrFormula, MealType, ServingUnit);

// --- Persisted records ---

/// Body metrics as entered by the user. `weight` and `height` are kept in the
/// unit system currently selected in [`AppData`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileData {
    pub activity: ActivityLevel,
    pub goal: Goal,
    pub weight: String,
    pub height: String,
    pub age: String,
    pub gender: Gender,
}

impl Default for ProfileData {
    fn default() -> Self {
        Self {
            activity: ActivityLevel::ModeratelyActive,
            goal: Goal::LoseWeight,
            weight: "70".to_string(),
            height: "175".to_string(),
            age: "28".to_string(),
            gender: Gender::Male,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppData {
    pub units: UnitSystem,
    pub tdee: BmrFormula,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMealEntry {
    pub id: String,
    pub food_id: String,
    pub food_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    pub meal_type: MealType,
    pub amount: f64,
    pub serving_unit: ServingUnit,
    pub serving_size: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub date: String,
    pub added_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMealEntry {
    pub food_id: String,
    pub food_name: String,
    pub emoji: Option<String>,
    pub meal_type: MealType,
    pub amount: f64,
    pub serving_unit: ServingUnit,
    pub serving_size: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub date: NaiveDate,
}

impl NewMealEntry {
    #[must_use]
    pub fn into_entry(self, id: String, added_at: String) -> DailyMealEntry {
        DailyMealEntry {
            id,
            food_id: self.food_id,
            food_name: self.food_name,
            emoji: self.emoji,
            meal_type: self.meal_type,
            amount: self.amount,
            serving_unit: self.serving_unit,
            serving_size: self.serving_size,
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            date: format_date(self.date),
            added_at,
        }
    }
}

/// Partial update for a [`DailyMealEntry`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateMealEntry {
    pub food_name: Option<String>,
    pub emoji: Option<Option<String>>,
    pub meal_type: Option<MealType>,
    pub amount: Option<f64>,
    pub serving_unit: Option<ServingUnit>,
    pub serving_size: Option<String>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
    pub date: Option<NaiveDate>,
}

impl UpdateMealEntry {
    pub fn apply(&self, entry: &mut DailyMealEntry) {
        if let Some(ref name) = self.food_name {
            entry.food_name.clone_from(name);
        }
        if let Some(ref emoji) = self.emoji {
            entry.emoji.clone_from(emoji);
        }
        if let Some(meal_type) = self.meal_type {
            entry.meal_type = meal_type;
        }
        if let Some(amount) = self.amount {
            entry.amount = amount;
        }
        if let Some(unit) = self.serving_unit {
            entry.serving_unit = unit;
        }
        if let Some(ref size) = self.serving_size {
            entry.serving_size.clone_from(size);
        }
        if let Some(v) = self.calories {
            entry.calories = v;
        }
        if let Some(v) = self.protein {
            entry.protein = v;
        }
        if let Some(v) = self.carbs {
            entry.carbs = v;
        }
        if let Some(v) = self.fat {
            entry.fat = v;
        }
        if let Some(date) = self.date {
            entry.date = format_date(date);
        }
    }
}

/// A user-defined food template. Macros are grams per serving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFood {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub serving_size: String,
    pub serving_unit: ServingUnit,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCustomFood {
    pub name: String,
    pub emoji: String,
    pub serving_size: String,
    pub serving_unit: ServingUnit,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCustomFood {
    pub name: Option<String>,
    pub emoji: Option<String>,
    pub serving_size: Option<String>,
    pub serving_unit: Option<ServingUnit>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
    pub carbs: Option<f64>,
    pub fat: Option<f64>,
}

impl UpdateCustomFood {
    pub fn apply(&self, food: &mut CustomFood) {
        if let Some(ref name) = self.name {
            food.name.clone_from(name);
        }
        if let Some(ref emoji) = self.emoji {
            food.emoji.clone_from(emoji);
        }
        if let Some(ref size) = self.serving_size {
            food.serving_size.clone_from(size);
        }
        if let Some(unit) = self.serving_unit {
            food.serving_unit = unit;
        }
        if let Some(v) = self.calories {
            food.calories = v;
        }
        if let Some(v) = self.protein {
            food.protein = v;
        }
        if let Some(v) = self.carbs {
            food.carbs = v;
        }
        if let Some(v) = self.fat {
            food.fat = v;
        }
    }
}

impl From<&NewCustomFood> for UpdateCustomFood {
    fn from(food: &NewCustomFood) -> Self {
        Self {
            name: Some(food.name.clone()),
            emoji: Some(food.emoji.clone()),
            serving_size: Some(food.serving_size.clone()),
            serving_unit: Some(food.serving_unit),
            calories: Some(food.calories),
            protein: Some(food.protein),
            carbs: Some(food.carbs),
            fat: Some(food.fat),
        }
    }
}

/// A food embedded in a meal preset. This is a copy taken when the food was
/// added, not a reference to the originating [`CustomFood`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPresetFood {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub servings: f64,
    pub calories_per_serving: f64,
    pub protein_per_serving: f64,
    pub carbs_per_serving: f64,
    pub fat_per_serving: f64,
    pub serving_size: String,
    pub serving_unit: ServingUnit,
    pub is_custom: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPreset {
    pub id: String,
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub foods: Vec<MealPresetFood>,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewMealPreset {
    pub name: String,
    pub description: String,
    pub emoji: String,
    pub foods: Vec<MealPresetFood>,
    pub total_calories: f64,
    pub total_protein: f64,
    pub total_carbs: f64,
    pub total_fat: f64,
}

impl NewMealPreset {
    /// Build a preset, snapshotting totals from `foods`. Calories round to whole
    /// numbers, macros to one decimal.
    #[must_use]
    pub fn from_foods(
        name: &str,
        description: &str,
        emoji: &str,
        foods: Vec<MealPresetFood>,
    ) -> Self {
        let totals = preset_totals(&foods);
        Self {
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            emoji: emoji.to_string(),
            foods,
            total_calories: totals.calories,
            total_protein: totals.protein,
            total_carbs: totals.carbs,
            total_fat: totals.fat,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateMealPreset {
    pub name: Option<String>,
    pub description: Option<String>,
    pub emoji: Option<String>,
    pub foods: Option<Vec<MealPresetFood>>,
    pub total_calories: Option<f64>,
    pub total_protein: Option<f64>,
    pub total_carbs: Option<f64>,
    pub total_fat: Option<f64>,
}

impl UpdateMealPreset {
    pub fn apply(&self, preset: &mut MealPreset) {
        if let Some(ref name) = self.name {
            preset.name.clone_from(name);
        }
        if let Some(ref description) = self.description {
            preset.description.clone_from(description);
        }
        if let Some(ref emoji) = self.emoji {
            preset.emoji.clone_from(emoji);
        }
        if let Some(ref foods) = self.foods {
            preset.foods.clone_from(foods);
        }
        if let Some(v) = self.total_calories {
            preset.total_calories = v;
        }
        if let Some(v) = self.total_protein {
            preset.total_protein = v;
        }
        if let Some(v) = self.total_carbs {
            preset.total_carbs = v;
        }
        if let Some(v) = self.total_fat {
            preset.total_fat = v;
        }
    }
}

impl From<&NewMealPreset> for UpdateMealPreset {
    fn from(preset: &NewMealPreset) -> Self {
        Self {
            name: Some(preset.name.clone()),
            description: Some(preset.description.clone()),
            emoji: Some(preset.emoji.clone()),
            foods: Some(preset.foods.clone()),
            total_calories: Some(preset.total_calories),
            total_protein: Some(preset.total_protein),
            total_carbs: Some(preset.total_carbs),
            total_fat: Some(preset.total_fat),
        }
    }
}

// --- Aggregates ---

/// Calorie and macro sums. Macros are grams.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Totals {
    #[must_use]
    pub fn of_entries<'a>(entries: impl IntoIterator<Item = &'a DailyMealEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |acc, e| Self {
            calories: acc.calories + e.calories,
            protein: acc.protein + e.protein,
            carbs: acc.carbs + e.carbs,
            fat: acc.fat + e.fat,
        })
    }
}

#[must_use]
pub fn preset_totals(foods: &[MealPresetFood]) -> Totals {
    let raw = foods.iter().fold(Totals::default(), |acc, f| Totals {
        calories: acc.calories + f.calories_per_serving * f.servings,
        protein: acc.protein + f.protein_per_serving * f.servings,
        carbs: acc.carbs + f.carbs_per_serving * f.servings,
        fat: acc.fat + f.fat_per_serving * f.servings,
    });
    Totals {
        calories: crate::nutrition::round_half_up(raw.calories),
        protein: crate::nutrition::round_to_tenth(raw.protein),
        carbs: crate::nutrition::round_to_tenth(raw.carbs),
        fat: crate::nutrition::round_to_tenth(raw.fat),
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MealSection {
    pub meal_type: MealType,
    pub entries: Vec<DailyMealEntry>,
    pub totals: Totals,
}

#[derive(Debug, Clone, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub units: UnitSystem,
    pub meals: Vec<MealSection>,
    pub totals: Totals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<crate::nutrition::NutritionPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining: Option<Totals>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeekDay {
    pub day: &'static str,
    pub date: String,
    pub calories: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WeeklySummary {
    pub week_start: String,
    pub days: Vec<WeekDay>,
    pub total_calories: f64,
    pub days_logged: usize,
    pub average_calories: f64,
}

// --- Export / Import types ---

/// Backup document bundling every persisted collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub profile_data: ProfileData,
    pub app_data: AppData,
    pub daily_meals: Vec<DailyMealEntry>,
    pub custom_foods: Vec<CustomFood>,
    pub meal_presets: Vec<MealPreset>,
    pub setup_status: i64,
    pub export_date: String,
    pub version: String,
}

/// Backup document as read back in. Every collection is optional; a missing
/// collection leaves current data untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportData {
    #[serde(default)]
    pub profile_data: Option<ProfileData>,
    #[serde(default)]
    pub app_data: Option<AppData>,
    #[serde(default)]
    pub daily_meals: Option<Vec<DailyMealEntry>>,
    #[serde(default)]
    pub custom_foods: Option<Vec<CustomFood>>,
    #[serde(default)]
    pub meal_presets: Option<Vec<MealPreset>>,
    #[serde(default)]
    pub setup_status: Option<i64>,
    #[serde(default)]
    pub export_date: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl From<ExportData> for ImportData {
    fn from(data: ExportData) -> Self {
        Self {
            profile_data: Some(data.profile_data),
            app_data: Some(data.app_data),
            daily_meals: Some(data.daily_meals),
            custom_foods: Some(data.custom_foods),
            meal_presets: Some(data.meal_presets),
            setup_status: Some(data.setup_status),
            export_date: Some(data.export_date),
            version: Some(data.version),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub profile_imported: bool,
    pub app_data_imported: bool,
    pub meal_dates_replaced: usize,
    pub meal_entries_imported: usize,
    pub custom_foods_imported: usize,
    pub meal_presets_imported: usize,
    pub setup_status_imported: bool,
}

// --- Helpers ---

#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// ISO-8601 UTC timestamp with millisecond precision, e.g. `2024-06-15T08:30:00.000Z`.
#[must_use]
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[must_use]
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(date: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date '{date}'. Must be YYYY-MM-DD"))
}

/// Accepts the stored meal names plus `snack` as an alias for `snacks`.
pub fn validate_meal_type(meal: &str) -> Result<MealType> {
    let lower = meal.trim().to_lowercase();
    if lower == "snack" {
        return Ok(MealType::Snacks);
    }
    MealType::ALL
        .iter()
        .copied()
        .find(|m| m.label() == lower)
        .ok_or_else(|| {
            let options: Vec<&str> = MealType::ALL.iter().map(|m| m.label()).collect();
            anyhow::anyhow!(
                "Invalid meal type '{meal}'. Must be one of: {}",
                options.join(", ")
            )
        })
}

/// Parse a profile number field. Rejects empty, non-numeric and non-positive values.
pub fn parse_profile_number(field: &str, value: &str) -> Result<f64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("Profile {field} is missing");
    }
    let parsed: f64 = trimmed
        .parse()
        .map_err(|_| anyhow::anyhow!("Profile {field} '{value}' is not a number"))?;
    if !parsed.is_finite() || parsed <= 0.0 {
        bail!("Profile {field} must be greater than 0");
    }
    Ok(parsed)
}

/// Validate that weight, height and age are all present and positive.
pub fn validate_profile(profile: &ProfileData) -> Result<()> {
    parse_profile_number("weight", &profile.weight)?;
    parse_profile_number("height", &profile.height)?;
    parse_profile_number("age", &profile.age)?;
    Ok(())
}

pub fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        bail!("Amount must be greater than 0");
    }
    Ok(())
}

fn validate_macro(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        bail!("{name} must be a non-negative number");
    }
    Ok(())
}

/// Validate a custom food: name and serving size required, nutrition non-negative.
pub fn validate_custom_food(food: &NewCustomFood) -> Result<()> {
    if food.name.trim().is_empty() {
        bail!("Please enter a food name");
    }
    if food.serving_size.trim().is_empty() {
        bail!("Please enter a serving size");
    }
    validate_macro("calories", food.calories)?;
    validate_macro("protein", food.protein)?;
    validate_macro("carbs", food.carbs)?;
    validate_macro("fat", food.fat)?;
    Ok(())
}

pub fn validate_meal_preset(preset: &NewMealPreset) -> Result<()> {
    if preset.name.trim().is_empty() {
        bail!("Please enter a preset name");
    }
    if preset.foods.is_empty() {
        bail!("A meal preset needs at least one food");
    }
    for food in &preset.foods {
        if !food.servings.is_finite() || food.servings <= 0.0 {
            bail!("Servings for '{}' must be greater than 0", food.name);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_entry() -> DailyMealEntry {
        DailyMealEntry {
            id: "1718440200000".to_string(),
            food_id: "oats".to_string(),
            food_name: "Oatmeal".to_string(),
            emoji: Some("🥣".to_string()),
            meal_type: MealType::Breakfast,
            amount: 80.0,
            serving_unit: ServingUnit::Grams,
            serving_size: "40g".to_string(),
            calories: 300.0,
            protein: 10.0,
            carbs: 54.0,
            fat: 6.0,
            date: "2024-06-15".to_string(),
            added_at: "2024-06-15T08:30:00.000Z".to_string(),
        }
    }

    fn preset_food(servings: f64) -> MealPresetFood {
        MealPresetFood {
            id: "egg_1".to_string(),
            name: "Egg".to_string(),
            emoji: None,
            image: None,
            servings,
            calories_per_serving: 78.0,
            protein_per_serving: 6.3,
            carbs_per_serving: 0.6,
            fat_per_serving: 5.3,
            serving_size: "1".to_string(),
            serving_unit: ServingUnit::Units,
            is_custom: true,
        }
    }

    #[test]
    fn test_profile_defaults() {
        let p = ProfileData::default();
        assert_eq!(p.activity, ActivityLevel::ModeratelyActive);
        assert_eq!(p.goal, Goal::LoseWeight);
        assert_eq!(p.weight, "70");
        assert_eq!(p.height, "175");
        assert_eq!(p.age, "28");
        assert_eq!(p.gender, Gender::Male);

        let a = AppData::default();
        assert_eq!(a.units, UnitSystem::Metric);
        assert_eq!(a.tdee, BmrFormula::MifflinStJeor);
    }

    #[test]
    fn test_profile_json_uses_app_strings() {
        let json = serde_json::to_value(ProfileData::default()).unwrap();
        assert_eq!(json["activity"], "Moderately Active");
        assert_eq!(json["goal"], "Lose Weight");
        assert_eq!(json["gender"], "Male");

        let app = serde_json::to_value(AppData {
            units: UnitSystem::Imperial,
            tdee: BmrFormula::KatchMcArdle,
        })
        .unwrap();
        assert_eq!(app["units"], "Imperial");
        assert_eq!(app["tdee"], "Katch-McArdle");
    }

    #[test]
    fn test_meal_entry_json_is_camel_case() {
        let json = serde_json::to_value(sample_entry()).unwrap();
        assert_eq!(json["foodId"], "oats");
        assert_eq!(json["mealType"], "breakfast");
        assert_eq!(json["servingUnit"], "grams");
        assert_eq!(json["addedAt"], "2024-06-15T08:30:00.000Z");
    }

    #[test]
    fn test_meal_entry_without_emoji_decodes() {
        let raw = r#"{"id":"1","foodId":"f","foodName":"Rice","mealType":"snacks","amount":1,
            "servingUnit":"units","servingSize":"1","calories":200,"protein":4,"carbs":44,"fat":0.4,
            "date":"2024-06-15","addedAt":"2024-06-15T12:00:00.000Z"}"#;
        let entry: DailyMealEntry = serde_json::from_str(raw).unwrap();
        assert!(entry.emoji.is_none());
        assert_eq!(entry.meal_type, MealType::Snacks);
        assert_eq!(entry.serving_unit, ServingUnit::Units);
    }

    #[test]
    fn test_valid_meal_types() {
        assert_eq!(validate_meal_type("breakfast").unwrap(), MealType::Breakfast);
        assert_eq!(validate_meal_type("Lunch").unwrap(), MealType::Lunch);
        assert_eq!(validate_meal_type("DINNER").unwrap(), MealType::Dinner);
        assert_eq!(validate_meal_type("snacks").unwrap(), MealType::Snacks);
        assert_eq!(validate_meal_type("snack").unwrap(), MealType::Snacks);
    }

    #[test]
    fn test_invalid_meal_type() {
        assert!(validate_meal_type("brunch").is_err());
        assert!(validate_meal_type("").is_err());
    }

    #[test]
    fn test_choice_parsing_is_forgiving() {
        assert_eq!(
            "moderately-active".parse::<ActivityLevel>().unwrap(),
            ActivityLevel::ModeratelyActive
        );
        assert_eq!("very".parse::<ActivityLevel>().unwrap(), ActivityLevel::VeryActive);
        assert_eq!("gain".parse::<Goal>().unwrap(), Goal::GainWeight);
        assert_eq!("Maintain Weight".parse::<Goal>().unwrap(), Goal::MaintainWeight);
        assert_eq!("imperial".parse::<UnitSystem>().unwrap(), UnitSystem::Imperial);
        assert_eq!(
            "harris-benedict".parse::<BmrFormula>().unwrap(),
            BmrFormula::HarrisBenedict
        );
        assert_eq!("katch".parse::<BmrFormula>().unwrap(), BmrFormula::KatchMcArdle);
        assert_eq!("f".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!("g".parse::<ServingUnit>().unwrap(), ServingUnit::Grams);
        assert_eq!("ML".parse::<ServingUnit>().unwrap(), ServingUnit::Ml);
    }

    #[test]
    fn test_choice_parsing_rejects_unknown() {
        assert!("couch potato".parse::<ActivityLevel>().is_err());
        assert!("bulk".parse::<Goal>().is_err());
        assert!("nautical".parse::<UnitSystem>().is_err());
        assert!("cups".parse::<ServingUnit>().is_err());
    }

    #[test]
    fn test_update_meal_entry_apply_partial() {
        let mut entry = sample_entry();
        UpdateMealEntry {
            meal_type: Some(MealType::Lunch),
            calories: Some(150.0),
            emoji: Some(None),
            ..Default::default()
        }
        .apply(&mut entry);
        assert_eq!(entry.meal_type, MealType::Lunch);
        assert!((entry.calories - 150.0).abs() < f64::EPSILON);
        assert!(entry.emoji.is_none());
        // Untouched fields keep their values
        assert_eq!(entry.food_name, "Oatmeal");
        assert!((entry.protein - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_totals_of_entries() {
        let a = sample_entry();
        let mut b = sample_entry();
        b.calories = 100.0;
        b.protein = 2.5;
        let totals = Totals::of_entries([&a, &b]);
        assert!((totals.calories - 400.0).abs() < f64::EPSILON);
        assert!((totals.protein - 12.5).abs() < f64::EPSILON);
        assert!((totals.carbs - 108.0).abs() < f64::EPSILON);
        assert!((totals.fat - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_preset_from_foods_snapshots_totals() {
        let preset = NewMealPreset::from_foods(
            " Breakfast ",
            "eggs",
            "🍳",
            vec![preset_food(2.0), preset_food(0.5)],
        );
        assert_eq!(preset.name, "Breakfast");
        // 78 * 2.5 = 195
        assert!((preset.total_calories - 195.0).abs() < f64::EPSILON);
        // 6.3 * 2.5 = 15.75 -> 15.8
        assert!((preset.total_protein - 15.8).abs() < 1e-9);
        // 0.6 * 2.5 = 1.5
        assert!((preset.total_carbs - 1.5).abs() < 1e-9);
        // 5.3 * 2.5 = 13.25 -> 13.3
        assert!((preset.total_fat - 13.3).abs() < 1e-9);
    }

    #[test]
    fn test_validate_profile() {
        assert!(validate_profile(&ProfileData::default()).is_ok());

        let mut p = ProfileData::default();
        p.weight = String::new();
        assert!(validate_profile(&p).is_err());

        let mut p = ProfileData::default();
        p.height = "tall".to_string();
        assert!(validate_profile(&p).is_err());

        let mut p = ProfileData::default();
        p.age = "-3".to_string();
        assert!(validate_profile(&p).is_err());
    }

    #[test]
    fn test_validate_custom_food() {
        let food = NewCustomFood {
            name: "Protein Shake".to_string(),
            emoji: "🥤".to_string(),
            serving_size: "300".to_string(),
            serving_unit: ServingUnit::Ml,
            calories: 160.0,
            protein: 30.0,
            carbs: 5.0,
            fat: 2.0,
        };
        assert!(validate_custom_food(&food).is_ok());

        let mut bad = food.clone();
        bad.name = "  ".to_string();
        assert!(validate_custom_food(&bad).is_err());

        let mut bad = food.clone();
        bad.serving_size = String::new();
        assert!(validate_custom_food(&bad).is_err());

        let mut bad = food;
        bad.fat = -1.0;
        assert!(validate_custom_food(&bad).is_err());
    }

    #[test]
    fn test_validate_meal_preset() {
        let ok = NewMealPreset::from_foods("Eggs", "", "🍳", vec![preset_food(2.0)]);
        assert!(validate_meal_preset(&ok).is_ok());

        let empty = NewMealPreset::from_foods("Eggs", "", "🍳", vec![]);
        assert!(validate_meal_preset(&empty).is_err());

        let unnamed = NewMealPreset::from_foods(" ", "", "🍳", vec![preset_food(1.0)]);
        assert!(validate_meal_preset(&unnamed).is_err());

        let zero = NewMealPreset::from_foods("Eggs", "", "🍳", vec![preset_food(0.0)]);
        assert!(validate_meal_preset(&zero).is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(150.0).is_ok());
        assert!(validate_amount(0.0).is_err());
        assert!(validate_amount(-5.0).is_err());
        assert!(validate_amount(f64::NAN).is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-06-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
        );
        assert!(parse_date("15/06/2024").is_err());
    }

    #[test]
    fn test_now_timestamp_is_iso_utc() {
        let ts = now_timestamp();
        assert!(ts.ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&ts).is_ok());
    }
}
