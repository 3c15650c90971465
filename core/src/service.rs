use std::path::Path;

use anyhow::{Result, bail};
use chrono::{Datelike, Duration, NaiveDate};
use tracing::info;

use crate::backup::BACKUP_VERSION;
use crate::catalog::{self, FoodOption};
use crate::models::{
    AppData, BmrFormula, CustomFood, DailyMealEntry, DaySummary, ExportData, ImportData,
    ImportSummary, MealPreset, MealPresetFood, MealSection, MealType, NewCustomFood, NewMealEntry,
    NewMealPreset, ProfileData, ServingUnit, Totals, UnitSystem, UpdateCustomFood, UpdateMealEntry,
    UpdateMealPreset, WeekDay, WeeklySummary, format_date, new_id, now_timestamp,
    validate_amount, validate_custom_food, validate_meal_preset, validate_profile,
};
use crate::nutrition::{NutritionPlan, nutrition_plan, round_half_up};
use crate::storage::Storage;
use crate::store::{KeyValueStore, MemoryStore, SqliteStore};
use crate::units::{
    amount_to_storage, convert_profile, macro_to_storage, serving_multiplier,
    serving_size_to_storage,
};

/// Application operations on top of the storage gateway.
///
/// Amounts and macro values passed in are in the user's current unit system;
/// everything returned is in stored (metric) units.
pub struct NibbleService<S: KeyValueStore> {
    storage: Storage<S>,
}

impl NibbleService<SqliteStore> {
    pub fn open(db_path: &Path) -> Result<Self> {
        Ok(Self::new(SqliteStore::open(db_path)?))
    }
}

impl NibbleService<MemoryStore> {
    #[must_use]
    pub fn new_in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Entry amount as stored. Ounces typed for a gram food become whole grams.
fn stored_entry_amount(amount: f64, unit: ServingUnit, units: UnitSystem) -> f64 {
    let stored = amount_to_storage(amount, unit, units);
    if units == UnitSystem::Imperial && unit == ServingUnit::Grams {
        round_half_up(stored)
    } else {
        stored
    }
}

impl<S: KeyValueStore> NibbleService<S> {
    pub fn new(store: S) -> Self {
        Self {
            storage: Storage::new(store),
        }
    }

    pub fn storage(&self) -> &Storage<S> {
        &self.storage
    }

    // --- Setup & settings ---

    pub fn is_setup_complete(&self) -> bool {
        self.storage.is_setup_complete()
    }

    /// Finish first-run setup. The formula always starts as Mifflin-St Jeor.
    pub fn complete_setup(&self, profile: &ProfileData, units: UnitSystem) -> Result<()> {
        validate_profile(profile)?;
        self.storage.save_profile_data(profile)?;
        self.storage.save_app_data(&AppData {
            units,
            tdee: BmrFormula::MifflinStJeor,
        })?;
        self.storage.set_setup_complete()?;
        info!(units = %units, "setup complete");
        Ok(())
    }

    pub fn profile(&self) -> ProfileData {
        self.storage.get_profile_data()
    }

    pub fn settings(&self) -> AppData {
        self.storage.get_app_data()
    }

    pub fn update_profile(&self, profile: &ProfileData) -> Result<()> {
        validate_profile(profile)?;
        self.storage.save_profile_data(profile)
    }

    /// Switch unit systems, rewriting the stored weight and height to match.
    pub fn change_units(&self, units: UnitSystem) -> Result<ProfileData> {
        let mut app = self.storage.get_app_data();
        let profile = self.storage.get_profile_data();
        if app.units == units {
            return Ok(profile);
        }
        let converted = convert_profile(&profile, app.units, units);
        self.storage.save_profile_data(&converted)?;
        app.units = units;
        self.storage.save_app_data(&app)?;
        info!(units = %units, "unit system changed");
        Ok(converted)
    }

    pub fn set_formula(&self, formula: BmrFormula) -> Result<AppData> {
        let mut app = self.storage.get_app_data();
        app.tdee = formula;
        self.storage.save_app_data(&app)?;
        Ok(app)
    }

    pub fn nutrition_plan(&self) -> Result<NutritionPlan> {
        nutrition_plan(
            &self.storage.get_profile_data(),
            &self.storage.get_app_data(),
        )
    }

    // --- Logging ---

    pub fn search_foods(&self, query: &str) -> Vec<FoodOption> {
        catalog::search(&self.storage.get_custom_foods(), query)
    }

    pub fn find_food(&self, id: &str) -> Result<FoodOption> {
        match catalog::find(&self.storage.get_custom_foods(), id) {
            Some(food) => Ok(food),
            None => bail!("Food {id} not found"),
        }
    }

    /// Log `amount` of a food. Gram amounts typed in ounces are stored as
    /// whole grams; macros are scaled by the serving multiplier and rounded.
    pub fn log_food(
        &self,
        food_id: &str,
        meal_type: MealType,
        amount: f64,
        date: NaiveDate,
    ) -> Result<DailyMealEntry> {
        let food = self.find_food(food_id)?;
        let units = self.storage.get_app_data().units;
        validate_amount(amount)?;

        let stored_amount = stored_entry_amount(amount, food.serving_unit, units);
        let multiplier = serving_multiplier(&food.serving_size, food.serving_unit, stored_amount)?;

        let entry = self.storage.add_meal_entry(NewMealEntry {
            food_id: food.id,
            food_name: food.name,
            emoji: food.emoji,
            meal_type,
            amount: stored_amount,
            serving_unit: food.serving_unit,
            serving_size: food.serving_size,
            calories: round_half_up(food.calories_per_serving * multiplier),
            protein: round_half_up(food.protein * multiplier),
            carbs: round_half_up(food.carbs * multiplier),
            fat: round_half_up(food.fat * multiplier),
            date,
        })?;
        info!(id = %entry.id, food = %entry.food_name, calories = entry.calories, "logged food");
        Ok(entry)
    }

    pub fn get_entry(&self, id: &str) -> Result<DailyMealEntry> {
        match self.storage.get_meal_entry(id) {
            Some(entry) => Ok(entry),
            None => bail!("Meal entry {id} not found"),
        }
    }

    /// Change an entry's amount (typed in the current unit system) and
    /// rescale its macros.
    pub fn edit_entry_amount(&self, id: &str, amount: f64) -> Result<DailyMealEntry> {
        validate_amount(amount)?;
        let original = self.get_entry(id)?;
        let units = self.storage.get_app_data().units;
        let stored = stored_entry_amount(amount, original.serving_unit, units);
        self.storage.update_meal_amount(id, stored, &original)?;
        self.get_entry(id)
    }

    pub fn update_entry(&self, id: &str, update: &UpdateMealEntry) -> Result<DailyMealEntry> {
        self.get_entry(id)?;
        if let Some(amount) = update.amount {
            validate_amount(amount)?;
        }
        self.storage.update_meal_entry(id, update)?;
        self.get_entry(id)
    }

    /// Returns whether an entry was removed.
    pub fn delete_entry(&self, id: &str) -> Result<bool> {
        if self.storage.get_meal_entry(id).is_none() {
            return Ok(false);
        }
        self.storage.delete_meal_entry(id)?;
        Ok(true)
    }

    // --- Summaries ---

    /// Entries for one day grouped by meal, with totals and, when the profile
    /// yields a plan, the goal and what is left of it.
    pub fn day_summary(&self, date: NaiveDate) -> DaySummary {
        let entries = self.storage.get_daily_meals(Some(date));
        let meals: Vec<MealSection> = MealType::ALL
            .iter()
            .map(|meal_type| {
                let entries: Vec<DailyMealEntry> = entries
                    .iter()
                    .filter(|e| e.meal_type == *meal_type)
                    .cloned()
                    .collect();
                MealSection {
                    meal_type: *meal_type,
                    totals: Totals::of_entries(&entries),
                    entries,
                }
            })
            .collect();
        let totals = Totals::of_entries(&entries);
        let goal = self.nutrition_plan().ok();
        #[allow(clippy::cast_precision_loss)]
        let remaining = goal.as_ref().map(|plan| Totals {
            calories: plan.daily_calories as f64 - totals.calories,
            protein: plan.macros.protein_g as f64 - totals.protein,
            carbs: plan.macros.carbs_g as f64 - totals.carbs,
            fat: plan.macros.fat_g as f64 - totals.fat,
        });

        DaySummary {
            date: format_date(date),
            units: self.storage.get_app_data().units,
            meals,
            totals,
            goal,
            remaining,
        }
    }

    /// Monday-to-Sunday calorie totals for the week containing `date`.
    pub fn weekly_summary(&self, date: NaiveDate) -> WeeklySummary {
        let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
        let goal = self.nutrition_plan().ok().map(|p| p.daily_calories);
        let all = self.storage.get_all_meals();

        let days: Vec<WeekDay> = WEEKDAY_LABELS
            .into_iter()
            .zip(0..)
            .map(|(label, offset)| {
                let day = format_date(monday + Duration::days(offset));
                let calories = all
                    .iter()
                    .filter(|e| e.date == day)
                    .map(|e| e.calories)
                    .sum();
                WeekDay {
                    day: label,
                    date: day,
                    calories,
                    goal,
                }
            })
            .collect();

        let total_calories: f64 = days.iter().map(|d| d.calories).sum();
        let days_logged = days.iter().filter(|d| d.calories > 0.0).count();
        #[allow(clippy::cast_precision_loss)]
        let average_calories = if days_logged > 0 {
            total_calories / days_logged as f64
        } else {
            0.0
        };

        WeeklySummary {
            week_start: format_date(monday),
            days,
            total_calories,
            days_logged,
            average_calories,
        }
    }

    // --- Custom foods ---

    pub fn custom_foods(&self) -> Vec<CustomFood> {
        self.storage.get_custom_foods()
    }

    pub fn get_custom_food(&self, id: &str) -> Result<CustomFood> {
        match self.storage.get_custom_food(id) {
            Some(food) => Ok(food),
            None => bail!("Custom food {id} not found"),
        }
    }

    /// Macro values and gram serving sizes typed in ounces become grams.
    fn custom_food_to_storage(&self, food: &NewCustomFood) -> Result<NewCustomFood> {
        validate_custom_food(food)?;
        let units = self.storage.get_app_data().units;
        Ok(NewCustomFood {
            name: food.name.trim().to_string(),
            emoji: food.emoji.clone(),
            serving_size: serving_size_to_storage(
                food.serving_size.trim(),
                food.serving_unit,
                units,
            ),
            serving_unit: food.serving_unit,
            calories: food.calories,
            protein: macro_to_storage(food.protein, units),
            carbs: macro_to_storage(food.carbs, units),
            fat: macro_to_storage(food.fat, units),
        })
    }

    pub fn add_custom_food(&self, food: &NewCustomFood) -> Result<CustomFood> {
        let food = self.custom_food_to_storage(food)?;
        let saved = self.storage.save_custom_food(food)?;
        info!(id = %saved.id, name = %saved.name, "created custom food");
        Ok(saved)
    }

    pub fn update_custom_food(&self, id: &str, food: &NewCustomFood) -> Result<CustomFood> {
        self.get_custom_food(id)?;
        let food = self.custom_food_to_storage(food)?;
        self.storage
            .update_custom_food(id, &UpdateCustomFood::from(&food))?;
        self.get_custom_food(id)
    }

    /// Apply a partial edit typed in the current unit system. Only the fields
    /// present in `edit` are converted; everything else keeps its stored value.
    /// A new serving size is read in the new serving unit when both change.
    pub fn edit_custom_food(&self, id: &str, edit: &UpdateCustomFood) -> Result<CustomFood> {
        let mut food = self.get_custom_food(id)?;
        let units = self.storage.get_app_data().units;
        let serving_unit = edit.serving_unit.unwrap_or(food.serving_unit);
        let update = UpdateCustomFood {
            name: edit.name.as_deref().map(|n| n.trim().to_string()),
            emoji: edit.emoji.clone(),
            serving_size: edit
                .serving_size
                .as_deref()
                .map(|size| serving_size_to_storage(size.trim(), serving_unit, units)),
            serving_unit: edit.serving_unit,
            calories: edit.calories,
            protein: edit.protein.map(|v| macro_to_storage(v, units)),
            carbs: edit.carbs.map(|v| macro_to_storage(v, units)),
            fat: edit.fat.map(|v| macro_to_storage(v, units)),
        };

        update.apply(&mut food);
        validate_custom_food(&NewCustomFood {
            name: food.name,
            emoji: food.emoji,
            serving_size: food.serving_size,
            serving_unit: food.serving_unit,
            calories: food.calories,
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
        })?;
        self.storage.update_custom_food(id, &update)?;
        self.get_custom_food(id)
    }

    /// Presets keep their own copy of the food and are not touched.
    pub fn delete_custom_food(&self, id: &str) -> Result<bool> {
        if self.storage.get_custom_food(id).is_none() {
            return Ok(false);
        }
        self.storage.delete_custom_food(id)?;
        Ok(true)
    }

    // --- Meal presets ---

    pub fn meal_presets(&self) -> Vec<MealPreset> {
        self.storage.get_meal_presets()
    }

    /// Presets whose name contains `query`, case-insensitive.
    pub fn find_presets(&self, query: &str) -> Vec<MealPreset> {
        let needle = query.trim().to_lowercase();
        self.storage
            .get_meal_presets()
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn get_meal_preset(&self, id: &str) -> Result<MealPreset> {
        match self.storage.get_meal_preset(id) {
            Some(preset) => Ok(preset),
            None => bail!("Meal preset {id} not found"),
        }
    }

    /// Snapshot a food for a preset. `amount` is converted to servings the
    /// same way logging does.
    pub fn preset_food(&self, food_id: &str, amount: f64) -> Result<MealPresetFood> {
        let food = self.find_food(food_id)?;
        let units = self.storage.get_app_data().units;
        validate_amount(amount)?;
        let stored = amount_to_storage(amount, food.serving_unit, units);
        let servings = serving_multiplier(&food.serving_size, food.serving_unit, stored)?;
        Ok(MealPresetFood {
            id: format!("{}_{}", food.id, new_id()),
            name: food.name,
            emoji: food.emoji,
            image: food.image,
            servings,
            calories_per_serving: food.calories_per_serving,
            protein_per_serving: food.protein,
            carbs_per_serving: food.carbs,
            fat_per_serving: food.fat,
            serving_size: food.serving_size,
            serving_unit: food.serving_unit,
            is_custom: food.is_custom,
        })
    }

    pub fn create_meal_preset(
        &self,
        name: &str,
        description: &str,
        emoji: &str,
        foods: Vec<MealPresetFood>,
    ) -> Result<MealPreset> {
        let preset = NewMealPreset::from_foods(name, description, emoji, foods);
        validate_meal_preset(&preset)?;
        let saved = self.storage.save_meal_preset(preset)?;
        info!(id = %saved.id, name = %saved.name, "created meal preset");
        Ok(saved)
    }

    /// Replace a preset's details and foods, recomputing its totals.
    pub fn update_meal_preset(
        &self,
        id: &str,
        name: &str,
        description: &str,
        emoji: &str,
        foods: Vec<MealPresetFood>,
    ) -> Result<MealPreset> {
        self.get_meal_preset(id)?;
        let preset = NewMealPreset::from_foods(name, description, emoji, foods);
        validate_meal_preset(&preset)?;
        self.storage
            .update_meal_preset(id, &UpdateMealPreset::from(&preset))?;
        self.get_meal_preset(id)
    }

    pub fn set_preset_food_servings(
        &self,
        preset_id: &str,
        food_id: &str,
        servings: f64,
    ) -> Result<MealPreset> {
        if !servings.is_finite() || servings <= 0.0 {
            bail!("Servings must be greater than 0");
        }
        let mut preset = self.get_meal_preset(preset_id)?;
        match preset.foods.iter_mut().find(|f| f.id == food_id) {
            Some(food) => food.servings = servings,
            None => bail!("Food {food_id} is not in preset {preset_id}"),
        }
        self.update_meal_preset(
            preset_id,
            &preset.name,
            &preset.description,
            &preset.emoji,
            preset.foods,
        )
    }

    pub fn remove_preset_food(&self, preset_id: &str, food_id: &str) -> Result<MealPreset> {
        let mut preset = self.get_meal_preset(preset_id)?;
        let before = preset.foods.len();
        preset.foods.retain(|f| f.id != food_id);
        if preset.foods.len() == before {
            bail!("Food {food_id} is not in preset {preset_id}");
        }
        self.update_meal_preset(
            preset_id,
            &preset.name,
            &preset.description,
            &preset.emoji,
            preset.foods,
        )
    }

    pub fn delete_meal_preset(&self, id: &str) -> Result<bool> {
        if self.storage.get_meal_preset(id).is_none() {
            return Ok(false);
        }
        self.storage.delete_meal_preset(id)?;
        Ok(true)
    }

    // --- Export / Import ---

    pub fn export_all(&self) -> ExportData {
        ExportData {
            profile_data: self.storage.get_profile_data(),
            app_data: self.storage.get_app_data(),
            daily_meals: self.storage.get_all_meals(),
            custom_foods: self.storage.get_custom_foods(),
            meal_presets: self.storage.get_meal_presets(),
            setup_status: self.storage.get_setup_status(),
            export_date: now_timestamp(),
            version: BACKUP_VERSION.to_string(),
        }
    }

    /// Replay a backup. Sections that are absent leave current data as is.
    /// Not atomic: a failure part-way keeps what was already written.
    pub fn import_all(&self, data: &ImportData) -> Result<ImportSummary> {
        let (Some(profile), Some(app)) = (&data.profile_data, &data.app_data) else {
            bail!("Invalid backup file format: profileData and appData are required");
        };

        let mut summary = ImportSummary::default();
        self.storage.save_profile_data(profile)?;
        summary.profile_imported = true;
        self.storage.save_app_data(app)?;
        summary.app_data_imported = true;

        if let Some(ref meals) = data.daily_meals {
            summary.meal_dates_replaced = self.storage.replace_meal_dates(meals)?;
            summary.meal_entries_imported = meals.len();
        }
        if let Some(ref foods) = data.custom_foods {
            summary.custom_foods_imported = self.storage.upsert_custom_foods(foods)?;
        }
        if let Some(ref presets) = data.meal_presets {
            summary.meal_presets_imported = self.storage.upsert_meal_presets(presets)?;
        }
        if let Some(status) = data.setup_status {
            self.storage.set_setup_status(status)?;
            summary.setup_status_imported = true;
        }

        info!(
            meals = summary.meal_entries_imported,
            foods = summary.custom_foods_imported,
            presets = summary.meal_presets_imported,
            "import finished"
        );
        Ok(summary)
    }

    pub fn clear_all_data(&self) -> Result<()> {
        self.storage.clear_all_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActivityLevel, Goal};

    fn service() -> NibbleService<MemoryStore> {
        let svc = NibbleService::new_in_memory();
        svc.complete_setup(&ProfileData::default(), UnitSystem::Metric)
            .unwrap();
        svc
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn shake() -> NewCustomFood {
        NewCustomFood {
            name: "Protein Shake".to_string(),
            emoji: "🥤".to_string(),
            serving_size: "300".to_string(),
            serving_unit: ServingUnit::Ml,
            calories: 160.0,
            protein: 30.0,
            carbs: 5.0,
            fat: 2.0,
        }
    }

    #[test]
    fn test_complete_setup() {
        let svc = NibbleService::new_in_memory();
        assert!(!svc.is_setup_complete());

        let mut profile = ProfileData::default();
        profile.weight = String::new();
        assert!(svc.complete_setup(&profile, UnitSystem::Metric).is_err());
        assert!(!svc.is_setup_complete());

        let mut profile = ProfileData::default();
        profile.goal = Goal::MaintainWeight;
        svc.complete_setup(&profile, UnitSystem::Imperial).unwrap();
        assert!(svc.is_setup_complete());
        assert_eq!(svc.profile().goal, Goal::MaintainWeight);
        assert_eq!(
            svc.settings(),
            AppData {
                units: UnitSystem::Imperial,
                tdee: BmrFormula::MifflinStJeor
            }
        );
    }

    #[test]
    fn test_change_units_converts_profile() {
        let svc = service();
        let converted = svc.change_units(UnitSystem::Imperial).unwrap();
        assert_eq!(converted.weight, "154.3");
        assert_eq!(converted.height, "68.9");
        assert_eq!(svc.settings().units, UnitSystem::Imperial);
        assert_eq!(svc.profile(), converted);

        // Same system again does nothing
        assert_eq!(svc.change_units(UnitSystem::Imperial).unwrap(), converted);

        let back = svc.change_units(UnitSystem::Metric).unwrap();
        assert_eq!(back.weight, "70.0");
        assert_eq!(back.height, "175.0");
    }

    #[test]
    fn test_plan_follows_settings() {
        let svc = service();
        assert_eq!(svc.nutrition_plan().unwrap().daily_calories, 2071);

        svc.set_formula(BmrFormula::HarrisBenedict).unwrap();
        let plan = svc.nutrition_plan().unwrap();
        assert_eq!(plan.formula, BmrFormula::HarrisBenedict);
        // round(1707.021 * 1.55) - 500
        assert_eq!(plan.daily_calories, 2146);

        let mut profile = svc.profile();
        profile.activity = ActivityLevel::Sedentary;
        profile.goal = Goal::MaintainWeight;
        svc.update_profile(&profile).unwrap();
        // round(1707.021 * 1.2)
        assert_eq!(svc.nutrition_plan().unwrap().daily_calories, 2048);
    }

    #[test]
    fn test_log_gram_food() {
        let svc = service();
        // Greek Yogurt: 130 kcal / 100g, 20p 9c 0f
        let entry = svc
            .log_food("2", MealType::Breakfast, 150.0, day("2024-06-15"))
            .unwrap();
        assert!((entry.amount - 150.0).abs() < f64::EPSILON);
        assert!((entry.calories - 195.0).abs() < f64::EPSILON);
        assert!((entry.protein - 30.0).abs() < f64::EPSILON);
        // 13.5 rounds up
        assert!((entry.carbs - 14.0).abs() < f64::EPSILON);
        assert_eq!(entry.date, "2024-06-15");
        assert_eq!(entry.food_id, "2");
    }

    #[test]
    fn test_log_unit_food_and_custom_food() {
        let svc = service();
        // Banana: 105 kcal per medium
        let banana = svc
            .log_food("1", MealType::Snacks, 2.0, day("2024-06-15"))
            .unwrap();
        assert!((banana.calories - 210.0).abs() < f64::EPSILON);

        let food = svc.add_custom_food(&shake()).unwrap();
        let entry = svc
            .log_food(&format!("custom_{}", food.id), MealType::Lunch, 150.0, day("2024-06-15"))
            .unwrap();
        assert!((entry.calories - 80.0).abs() < f64::EPSILON);
        assert!((entry.protein - 15.0).abs() < f64::EPSILON);
        assert_eq!(entry.emoji.as_deref(), Some("🥤"));
    }

    #[test]
    fn test_log_in_imperial_stores_grams() {
        let svc = service();
        svc.change_units(UnitSystem::Imperial).unwrap();
        // 4 oz of chicken -> 113 g -> 1.13 servings of 231 kcal
        let entry = svc
            .log_food("3", MealType::Dinner, 4.0, day("2024-06-15"))
            .unwrap();
        assert!((entry.amount - 113.0).abs() < f64::EPSILON);
        assert!((entry.calories - 261.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_log_rejects_bad_input() {
        let svc = service();
        assert!(svc.log_food("999", MealType::Lunch, 1.0, day("2024-06-15")).is_err());
        assert!(svc.log_food("2", MealType::Lunch, 0.0, day("2024-06-15")).is_err());
        assert!(svc.storage().get_all_meals().is_empty());
    }

    #[test]
    fn test_edit_entry_amount() {
        let svc = service();
        let entry = svc
            .log_food("2", MealType::Breakfast, 100.0, day("2024-06-15"))
            .unwrap();
        let edited = svc.edit_entry_amount(&entry.id, 250.0).unwrap();
        assert!((edited.amount - 250.0).abs() < f64::EPSILON);
        assert!((edited.calories - 325.0).abs() < f64::EPSILON);
        assert!((edited.protein - 50.0).abs() < f64::EPSILON);
        // 9 * 2.5 = 22.5 rounds up
        assert!((edited.carbs - 23.0).abs() < f64::EPSILON);

        assert!(svc.edit_entry_amount(&entry.id, -1.0).is_err());
        assert!(svc.edit_entry_amount("missing", 10.0).is_err());
    }

    #[test]
    fn test_edit_amount_in_imperial_converts_ounces() {
        let svc = service();
        let entry = svc
            .log_food("2", MealType::Breakfast, 100.0, day("2024-06-15"))
            .unwrap();
        svc.change_units(UnitSystem::Imperial).unwrap();
        let edited = svc.edit_entry_amount(&entry.id, 2.0).unwrap();
        // 2 oz = 56.699 g, stored as whole grams like a fresh log
        assert!((edited.amount - 57.0).abs() < f64::EPSILON);
        // 130 * 0.57 = 74.1
        assert!((edited.calories - 74.0).abs() < f64::EPSILON);

        let logged = svc
            .log_food("2", MealType::Lunch, 2.0, day("2024-06-15"))
            .unwrap();
        assert!((logged.amount - edited.amount).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_and_delete_entry() {
        let svc = service();
        let entry = svc
            .log_food("1", MealType::Snacks, 1.0, day("2024-06-15"))
            .unwrap();
        let moved = svc
            .update_entry(
                &entry.id,
                &UpdateMealEntry {
                    meal_type: Some(MealType::Breakfast),
                    date: Some(day("2024-06-16")),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(moved.meal_type, MealType::Breakfast);
        assert_eq!(moved.date, "2024-06-16");

        assert!(svc.delete_entry(&entry.id).unwrap());
        assert!(!svc.delete_entry(&entry.id).unwrap());
    }

    #[test]
    fn test_day_summary() {
        let svc = service();
        let d = day("2024-06-15");
        svc.log_food("2", MealType::Breakfast, 100.0, d).unwrap();
        svc.log_food("1", MealType::Breakfast, 1.0, d).unwrap();
        svc.log_food("7", MealType::Dinner, 200.0, d).unwrap();
        svc.log_food("1", MealType::Lunch, 1.0, day("2024-06-16"))
            .unwrap();

        let summary = svc.day_summary(d);
        assert_eq!(summary.meals.len(), 4);
        assert_eq!(summary.meals[0].meal_type, MealType::Breakfast);
        assert_eq!(summary.meals[0].entries.len(), 2);
        assert!((summary.meals[0].totals.calories - 235.0).abs() < f64::EPSILON);
        assert!(summary.meals[1].entries.is_empty());
        assert!((summary.meals[2].totals.calories - 412.0).abs() < f64::EPSILON);
        assert!((summary.totals.calories - 647.0).abs() < f64::EPSILON);

        let goal = summary.goal.unwrap();
        assert_eq!(goal.daily_calories, 2071);
        let remaining = summary.remaining.unwrap();
        assert!((remaining.calories - 1424.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_day_summary_without_valid_profile() {
        let svc = NibbleService::new_in_memory();
        let mut profile = ProfileData::default();
        profile.age = "unknown".to_string();
        svc.storage().save_profile_data(&profile).unwrap();
        let summary = svc.day_summary(day("2024-06-15"));
        assert!(summary.goal.is_none());
        assert!(summary.remaining.is_none());
    }

    #[test]
    fn test_weekly_summary_runs_monday_to_sunday() {
        let svc = service();
        // 2024-06-12 is a Wednesday
        svc.log_food("1", MealType::Snacks, 2.0, day("2024-06-10"))
            .unwrap();
        svc.log_food("1", MealType::Snacks, 1.0, day("2024-06-16"))
            .unwrap();
        svc.log_food("1", MealType::Snacks, 5.0, day("2024-06-17"))
            .unwrap();

        let week = svc.weekly_summary(day("2024-06-12"));
        assert_eq!(week.week_start, "2024-06-10");
        assert_eq!(week.days.len(), 7);
        assert_eq!(week.days[0].day, "Mon");
        assert_eq!(week.days[6].date, "2024-06-16");
        assert!((week.days[0].calories - 210.0).abs() < f64::EPSILON);
        assert!((week.days[6].calories - 105.0).abs() < f64::EPSILON);
        assert!((week.total_calories - 315.0).abs() < f64::EPSILON);
        assert_eq!(week.days_logged, 2);
        assert!((week.average_calories - 157.5).abs() < f64::EPSILON);
        assert_eq!(week.days[3].goal, Some(2071));

        // Sunday belongs to the week that started the previous Monday
        assert_eq!(svc.weekly_summary(day("2024-06-16")).week_start, "2024-06-10");
    }

    #[test]
    fn test_custom_food_lifecycle() {
        let svc = service();
        let food = svc.add_custom_food(&shake()).unwrap();
        assert_eq!(svc.custom_foods().len(), 1);

        let mut edit = shake();
        edit.calories = 180.0;
        let updated = svc.update_custom_food(&food.id, &edit).unwrap();
        assert!((updated.calories - 180.0).abs() < f64::EPSILON);
        assert_eq!(updated.created_at, food.created_at);

        let mut bad = shake();
        bad.name = String::new();
        assert!(svc.add_custom_food(&bad).is_err());
        assert!(svc.update_custom_food("missing", &shake()).is_err());

        assert!(svc.delete_custom_food(&food.id).unwrap());
        assert!(!svc.delete_custom_food(&food.id).unwrap());
    }

    #[test]
    fn test_custom_food_in_imperial_stores_grams() {
        let svc = service();
        svc.change_units(UnitSystem::Imperial).unwrap();
        let food = svc
            .add_custom_food(&NewCustomFood {
                name: "Jerky".to_string(),
                emoji: "🥩".to_string(),
                serving_size: "1".to_string(),
                serving_unit: ServingUnit::Grams,
                calories: 116.0,
                protein: 1.0,
                carbs: 0.0,
                fat: 0.5,
            })
            .unwrap();
        assert_eq!(food.serving_size, "28.3");
        assert!((food.protein - 28.3).abs() < 1e-9);
        assert!((food.fat - 14.2).abs() < 1e-9);
        assert!((food.calories - 116.0).abs() < f64::EPSILON);
    }

    fn granola() -> NewCustomFood {
        NewCustomFood {
            name: "Granola".to_string(),
            emoji: "🥣".to_string(),
            serving_size: "30".to_string(),
            serving_unit: ServingUnit::Grams,
            calories: 130.0,
            protein: 2.0,
            carbs: 20.0,
            fat: 6.0,
        }
    }

    #[test]
    fn test_edit_custom_food_in_imperial_keeps_untouched_fields() {
        let svc = service();
        let food = svc.add_custom_food(&granola()).unwrap();
        svc.change_units(UnitSystem::Imperial).unwrap();

        let edit = UpdateCustomFood {
            calories: Some(150.0),
            ..Default::default()
        };
        let edited = svc.edit_custom_food(&food.id, &edit).unwrap();
        assert!((edited.calories - 150.0).abs() < f64::EPSILON);
        assert_eq!(edited.serving_size, "30");
        assert!((edited.protein - 2.0).abs() < f64::EPSILON);
        assert!((edited.carbs - 20.0).abs() < f64::EPSILON);
        assert!((edited.fat - 6.0).abs() < f64::EPSILON);

        // Supplied macros are ounces
        let edit = UpdateCustomFood {
            protein: Some(1.0),
            ..Default::default()
        };
        let edited = svc.edit_custom_food(&food.id, &edit).unwrap();
        assert!((edited.protein - 28.3).abs() < 1e-9);
        assert!((edited.fat - 6.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_edit_custom_food_serving_unit_switch() {
        let svc = service();
        let food = svc.add_custom_food(&granola()).unwrap();
        svc.change_units(UnitSystem::Imperial).unwrap();

        let edit = UpdateCustomFood {
            serving_unit: Some(ServingUnit::Units),
            ..Default::default()
        };
        let edited = svc.edit_custom_food(&food.id, &edit).unwrap();
        assert_eq!(edited.serving_unit, ServingUnit::Units);
        assert_eq!(edited.serving_size, "30");

        // Back to grams with a size typed in ounces
        let edit = UpdateCustomFood {
            serving_unit: Some(ServingUnit::Grams),
            serving_size: Some("2".to_string()),
            ..Default::default()
        };
        let edited = svc.edit_custom_food(&food.id, &edit).unwrap();
        assert_eq!(edited.serving_size, "56.7");

        // A size for a unit food is never converted
        let edit = UpdateCustomFood {
            serving_unit: Some(ServingUnit::Units),
            serving_size: Some("2".to_string()),
            ..Default::default()
        };
        let edited = svc.edit_custom_food(&food.id, &edit).unwrap();
        assert_eq!(edited.serving_size, "2");
    }

    #[test]
    fn test_edit_custom_food_validates_result() {
        let svc = service();
        let food = svc.add_custom_food(&granola()).unwrap();
        let edit = UpdateCustomFood {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(svc.edit_custom_food(&food.id, &edit).is_err());
        assert_eq!(svc.get_custom_food(&food.id).unwrap().name, "Granola");
        assert!(svc.edit_custom_food("missing", &UpdateCustomFood::default()).is_err());
    }

    #[test]
    fn test_preset_builder() {
        let svc = service();
        let eggs_food = svc
            .add_custom_food(&NewCustomFood {
                name: "Egg".to_string(),
                emoji: "🥚".to_string(),
                serving_size: "1".to_string(),
                serving_unit: ServingUnit::Units,
                calories: 78.0,
                protein: 6.3,
                carbs: 0.6,
                fat: 5.3,
            })
            .unwrap();

        let eggs = svc.preset_food(&format!("custom_{}", eggs_food.id), 2.0).unwrap();
        assert!((eggs.servings - 2.0).abs() < f64::EPSILON);
        assert!(eggs.is_custom);
        let oj = svc.preset_food("8", 125.0).unwrap();
        assert!((oj.servings - 0.5).abs() < f64::EPSILON);
        assert!(oj.id.starts_with("8_"));

        let preset = svc
            .create_meal_preset("Breakfast", "eggs + juice", "🍳", vec![eggs, oj.clone()])
            .unwrap();
        // 156 + 56
        assert!((preset.total_calories - 212.0).abs() < f64::EPSILON);
        // 12.6 + 0.85 = 13.45 -> 13.5
        assert!((preset.total_protein - 13.5).abs() < 1e-9);

        let updated = svc.set_preset_food_servings(&preset.id, &oj.id, 1.0).unwrap();
        assert!((updated.total_calories - 268.0).abs() < f64::EPSILON);
        assert_eq!(updated.created_at, preset.created_at);

        let trimmed = svc.remove_preset_food(&preset.id, &oj.id).unwrap();
        assert_eq!(trimmed.foods.len(), 1);
        assert!((trimmed.total_calories - 156.0).abs() < f64::EPSILON);

        // A preset cannot lose its last food
        let only = trimmed.foods[0].id.clone();
        assert!(svc.remove_preset_food(&preset.id, &only).is_err());
        assert!(svc.set_preset_food_servings(&preset.id, &only, 0.0).is_err());

        assert_eq!(svc.find_presets("break").len(), 1);
        assert!(svc.find_presets("dinner").is_empty());

        // Deleting the source food does not touch the preset
        svc.delete_custom_food(&eggs_food.id).unwrap();
        assert_eq!(svc.get_meal_preset(&preset.id).unwrap(), trimmed);

        assert!(svc.delete_meal_preset(&preset.id).unwrap());
        assert!(svc.meal_presets().is_empty());
    }

    #[test]
    fn test_create_preset_validation() {
        let svc = service();
        assert!(svc.create_meal_preset("Empty", "", "🍽", vec![]).is_err());
        let food = svc.preset_food("1", 1.0).unwrap();
        assert!(svc.create_meal_preset("  ", "", "🍽", vec![food]).is_err());
    }

    #[test]
    fn test_export_import_round_trip() {
        let source = service();
        source
            .log_food("1", MealType::Snacks, 1.0, day("2024-06-15"))
            .unwrap();
        source.add_custom_food(&shake()).unwrap();
        let food = source.preset_food("2", 200.0).unwrap();
        source
            .create_meal_preset("Yogurt bowl", "", "🥣", vec![food])
            .unwrap();
        let export = source.export_all();
        assert_eq!(export.version, "1.0");
        assert_eq!(export.setup_status, 1);

        let target = NibbleService::new_in_memory();
        let summary = target.import_all(&ImportData::from(export.clone())).unwrap();
        assert!(summary.profile_imported);
        assert_eq!(summary.meal_entries_imported, 1);
        assert_eq!(summary.meal_dates_replaced, 1);
        assert_eq!(summary.custom_foods_imported, 1);
        assert_eq!(summary.meal_presets_imported, 1);
        assert!(target.is_setup_complete());

        let again = target.export_all();
        assert_eq!(again.daily_meals, export.daily_meals);
        assert_eq!(again.custom_foods, export.custom_foods);
        assert_eq!(again.meal_presets, export.meal_presets);
        assert_eq!(again.profile_data, export.profile_data);
    }

    #[test]
    fn test_import_without_daily_meals_keeps_meals() {
        let svc = service();
        let entry = svc
            .log_food("1", MealType::Snacks, 1.0, day("2024-06-15"))
            .unwrap();

        let mut profile = ProfileData::default();
        profile.weight = "90".to_string();
        let data = ImportData {
            profile_data: Some(profile),
            app_data: Some(AppData {
                units: UnitSystem::Metric,
                tdee: BmrFormula::Cunningham,
            }),
            ..ImportData::default()
        };
        let summary = svc.import_all(&data).unwrap();
        assert_eq!(summary.meal_entries_imported, 0);
        assert!(!summary.setup_status_imported);

        assert_eq!(svc.storage().get_all_meals(), vec![entry]);
        assert_eq!(svc.profile().weight, "90");
        assert_eq!(svc.settings().tdee, BmrFormula::Cunningham);
    }

    #[test]
    fn test_import_requires_profile_and_settings() {
        let svc = service();
        let data = ImportData {
            profile_data: Some(ProfileData::default()),
            ..ImportData::default()
        };
        assert!(svc.import_all(&data).is_err());
    }

    #[test]
    fn test_clear_all_data() {
        let svc = service();
        svc.log_food("1", MealType::Snacks, 1.0, day("2024-06-15"))
            .unwrap();
        svc.clear_all_data().unwrap();
        assert!(!svc.is_setup_complete());
        assert!(svc.storage().get_all_meals().is_empty());
        assert_eq!(svc.profile(), ProfileData::default());
    }
}
