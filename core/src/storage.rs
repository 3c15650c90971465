//! Typed collections over a [`KeyValueStore`].
//!
//! Every collection lives as one JSON document under a fixed key. Reads never
//! fail: a missing key, a store error or a bad document all yield the default
//! (errors are logged). Writes serialize the whole collection and propagate
//! failures.

use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, warn};

use crate::models::{
    AppData, CustomFood, DailyMealEntry, MealPreset, MealType, NewCustomFood, NewMealEntry,
    NewMealPreset, ProfileData, UpdateCustomFood, UpdateMealEntry, UpdateMealPreset, format_date,
    new_id, now_timestamp, validate_amount,
};
use crate::nutrition::round_half_up;
use crate::store::KeyValueStore;

pub const CUSTOM_FOODS_KEY: &str = "custom_foods";
pub const MEAL_PRESETS_KEY: &str = "meal_presets";
pub const DAILY_MEALS_KEY: &str = "daily_meals";
pub const PROFILE_DATA_KEY: &str = "profile_data";
pub const APP_DATA_KEY: &str = "app_data";
pub const SETUP_COMPLETE_KEY: &str = "setup_complete";

pub const ALL_KEYS: [&str; 6] = [
    CUSTOM_FOODS_KEY,
    MEAL_PRESETS_KEY,
    DAILY_MEALS_KEY,
    PROFILE_DATA_KEY,
    APP_DATA_KEY,
    SETUP_COMPLETE_KEY,
];

/// Decode the stored setup flag. Older installs wrote `"true"`/`"false"`.
#[must_use]
pub fn parse_setup_status(raw: &str) -> i64 {
    match raw.trim() {
        "true" => 1,
        "false" => 0,
        other => {
            let digits: String = other
                .char_indices()
                .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
                .map(|(_, c)| c)
                .collect();
            digits.parse().unwrap_or(0)
        }
    }
}

pub struct Storage<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> Storage<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str, what: &str) -> Option<T> {
        let raw = match self.store.get_item(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                error!(key, "Error loading {what}: {e:#}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!(key, "Error loading {what}: {e}");
                None
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T, what: &str) -> Result<()> {
        let raw = serde_json::to_string(value).with_context(|| format!("Error saving {what}"))?;
        self.store
            .set_item(key, &raw)
            .inspect_err(|e| error!(key, "Error saving {what}: {e:#}"))
            .with_context(|| format!("Error saving {what}"))?;
        debug!(key, bytes = raw.len(), "saved {what}");
        Ok(())
    }

    // --- Profile ---

    pub fn get_profile_data(&self) -> ProfileData {
        self.read_json(PROFILE_DATA_KEY, "profile data")
            .unwrap_or_default()
    }

    pub fn save_profile_data(&self, profile: &ProfileData) -> Result<()> {
        self.write_json(PROFILE_DATA_KEY, profile, "profile data")
    }

    pub fn get_app_data(&self) -> AppData {
        self.read_json(APP_DATA_KEY, "app data").unwrap_or_default()
    }

    pub fn save_app_data(&self, app: &AppData) -> Result<()> {
        self.write_json(APP_DATA_KEY, app, "app data")
    }

    // --- Setup status ---

    pub fn get_setup_status(&self) -> i64 {
        match self.store.get_item(SETUP_COMPLETE_KEY) {
            Ok(Some(raw)) => parse_setup_status(&raw),
            Ok(None) => 0,
            Err(e) => {
                error!("Error loading setup status: {e:#}");
                0
            }
        }
    }

    pub fn set_setup_status(&self, status: i64) -> Result<()> {
        self.store
            .set_item(SETUP_COMPLETE_KEY, &status.to_string())
            .inspect_err(|e| error!("Error saving setup status: {e:#}"))
            .context("Error saving setup status")
    }

    pub fn is_setup_complete(&self) -> bool {
        self.get_setup_status() == 1
    }

    pub fn set_setup_complete(&self) -> Result<()> {
        self.set_setup_status(1)
    }

    pub fn clear_setup_status(&self) -> Result<()> {
        self.store
            .remove_item(SETUP_COMPLETE_KEY)
            .inspect_err(|e| error!("Error clearing setup status: {e:#}"))
            .context("Error clearing setup status")?;
        Ok(())
    }

    /// Remove every collection this gateway owns.
    pub fn clear_all_data(&self) -> Result<()> {
        self.store
            .multi_remove(&ALL_KEYS)
            .inspect_err(|e| error!("Error clearing data: {e:#}"))
            .context("Error clearing data")?;
        warn!("all stored data cleared");
        Ok(())
    }

    // --- Daily meals ---

    pub fn get_all_meals(&self) -> Vec<DailyMealEntry> {
        self.read_json(DAILY_MEALS_KEY, "daily meals")
            .unwrap_or_default()
    }

    /// Entries for `date`, or every entry when `date` is `None`.
    pub fn get_daily_meals(&self, date: Option<NaiveDate>) -> Vec<DailyMealEntry> {
        let meals = self.get_all_meals();
        match date {
            Some(date) => {
                let date = format_date(date);
                meals.into_iter().filter(|m| m.date == date).collect()
            }
            None => meals,
        }
    }

    pub fn get_meals_by_type(
        &self,
        meal_type: MealType,
        date: Option<NaiveDate>,
    ) -> Vec<DailyMealEntry> {
        self.get_daily_meals(date)
            .into_iter()
            .filter(|m| m.meal_type == meal_type)
            .collect()
    }

    pub fn get_meal_entry(&self, id: &str) -> Option<DailyMealEntry> {
        self.get_all_meals().into_iter().find(|m| m.id == id)
    }

    fn save_all_meals(&self, meals: &[DailyMealEntry]) -> Result<()> {
        self.write_json(DAILY_MEALS_KEY, meals, "daily meals")
    }

    /// Replace every entry dated `date` with `meals`. Entries for other dates
    /// are kept, and each of `meals` is re-dated to `date`.
    pub fn save_meals_for_date(&self, date: NaiveDate, meals: &[DailyMealEntry]) -> Result<()> {
        let date = format_date(date);
        let mut all: Vec<DailyMealEntry> = self
            .get_all_meals()
            .into_iter()
            .filter(|m| m.date != date)
            .collect();
        all.extend(meals.iter().cloned().map(|mut m| {
            m.date.clone_from(&date);
            m
        }));
        self.save_all_meals(&all)
    }

    pub fn add_meal_entry(&self, entry: NewMealEntry) -> Result<DailyMealEntry> {
        let entry = entry.into_entry(new_id(), now_timestamp());
        let mut all = self.get_all_meals();
        all.push(entry.clone());
        self.save_all_meals(&all)?;
        Ok(entry)
    }

    /// Apply `update` to the entry with `id`. An unknown id rewrites the
    /// collection unchanged.
    pub fn update_meal_entry(&self, id: &str, update: &UpdateMealEntry) -> Result<()> {
        let mut all = self.get_all_meals();
        if let Some(entry) = all.iter_mut().find(|m| m.id == id) {
            update.apply(entry);
        }
        self.save_all_meals(&all)
    }

    /// Change an entry's amount, scaling each macro by `new / original` and
    /// rounding to whole numbers.
    pub fn update_meal_amount(
        &self,
        id: &str,
        new_amount: f64,
        original: &DailyMealEntry,
    ) -> Result<()> {
        validate_amount(new_amount)?;
        if !original.amount.is_finite() || original.amount == 0.0 {
            bail!("Entry has no amount to scale from");
        }
        let ratio = new_amount / original.amount;
        let update = UpdateMealEntry {
            amount: Some(new_amount),
            calories: Some(round_half_up(original.calories * ratio)),
            protein: Some(round_half_up(original.protein * ratio)),
            carbs: Some(round_half_up(original.carbs * ratio)),
            fat: Some(round_half_up(original.fat * ratio)),
            ..Default::default()
        };
        self.update_meal_entry(id, &update)
    }

    pub fn delete_meal_entry(&self, id: &str) -> Result<()> {
        let all: Vec<DailyMealEntry> = self
            .get_all_meals()
            .into_iter()
            .filter(|m| m.id != id)
            .collect();
        self.save_all_meals(&all)
    }

    /// Group entries by date and replace each of those dates.
    /// Returns the number of dates written.
    pub fn replace_meal_dates(&self, entries: &[DailyMealEntry]) -> Result<usize> {
        let mut by_date: BTreeMap<&str, Vec<DailyMealEntry>> = BTreeMap::new();
        for entry in entries {
            by_date
                .entry(entry.date.as_str())
                .or_default()
                .push(entry.clone());
        }
        for (date, meals) in &by_date {
            let date = crate::models::parse_date(date)?;
            self.save_meals_for_date(date, meals)?;
        }
        Ok(by_date.len())
    }

    // --- Custom foods ---

    pub fn get_custom_foods(&self) -> Vec<CustomFood> {
        self.read_json(CUSTOM_FOODS_KEY, "custom foods")
            .unwrap_or_default()
    }

    pub fn get_custom_food(&self, id: &str) -> Option<CustomFood> {
        self.get_custom_foods().into_iter().find(|f| f.id == id)
    }

    fn save_custom_foods(&self, foods: &[CustomFood]) -> Result<()> {
        self.write_json(CUSTOM_FOODS_KEY, foods, "custom foods")
    }

    pub fn save_custom_food(&self, food: NewCustomFood) -> Result<CustomFood> {
        let food = CustomFood {
            id: new_id(),
            name: food.name,
            emoji: food.emoji,
            serving_size: food.serving_size,
            serving_unit: food.serving_unit,
            calories: food.calories,
            protein: food.protein,
            carbs: food.carbs,
            fat: food.fat,
            created_at: now_timestamp(),
        };
        let mut all = self.get_custom_foods();
        all.push(food.clone());
        self.save_custom_foods(&all)?;
        Ok(food)
    }

    pub fn update_custom_food(&self, id: &str, update: &UpdateCustomFood) -> Result<()> {
        let mut all = self.get_custom_foods();
        if let Some(food) = all.iter_mut().find(|f| f.id == id) {
            update.apply(food);
        }
        self.save_custom_foods(&all)
    }

    /// Meal presets holding a copy of this food are left alone.
    pub fn delete_custom_food(&self, id: &str) -> Result<()> {
        let all: Vec<CustomFood> = self
            .get_custom_foods()
            .into_iter()
            .filter(|f| f.id != id)
            .collect();
        self.save_custom_foods(&all)
    }

    /// Insert or replace foods by id. Returns how many were written.
    pub fn upsert_custom_foods(&self, foods: &[CustomFood]) -> Result<usize> {
        let mut all = self.get_custom_foods();
        for food in foods {
            match all.iter_mut().find(|f| f.id == food.id) {
                Some(existing) => *existing = food.clone(),
                None => all.push(food.clone()),
            }
        }
        self.save_custom_foods(&all)?;
        Ok(foods.len())
    }

    // --- Meal presets ---

    pub fn get_meal_presets(&self) -> Vec<MealPreset> {
        self.read_json(MEAL_PRESETS_KEY, "meal presets")
            .unwrap_or_default()
    }

    pub fn get_meal_preset(&self, id: &str) -> Option<MealPreset> {
        self.get_meal_presets().into_iter().find(|p| p.id == id)
    }

    fn save_meal_presets(&self, presets: &[MealPreset]) -> Result<()> {
        self.write_json(MEAL_PRESETS_KEY, presets, "meal presets")
    }

    pub fn save_meal_preset(&self, preset: NewMealPreset) -> Result<MealPreset> {
        let preset = MealPreset {
            id: new_id(),
            name: preset.name,
            description: preset.description,
            emoji: preset.emoji,
            foods: preset.foods,
            total_calories: preset.total_calories,
            total_protein: preset.total_protein,
            total_carbs: preset.total_carbs,
            total_fat: preset.total_fat,
            created_at: now_timestamp(),
        };
        let mut all = self.get_meal_presets();
        all.push(preset.clone());
        self.save_meal_presets(&all)?;
        Ok(preset)
    }

    pub fn update_meal_preset(&self, id: &str, update: &UpdateMealPreset) -> Result<()> {
        let mut all = self.get_meal_presets();
        if let Some(preset) = all.iter_mut().find(|p| p.id == id) {
            update.apply(preset);
        }
        self.save_meal_presets(&all)
    }

    pub fn delete_meal_preset(&self, id: &str) -> Result<()> {
        let all: Vec<MealPreset> = self
            .get_meal_presets()
            .into_iter()
            .filter(|p| p.id != id)
            .collect();
        self.save_meal_presets(&all)
    }

    pub fn upsert_meal_presets(&self, presets: &[MealPreset]) -> Result<usize> {
        let mut all = self.get_meal_presets();
        for preset in presets {
            match all.iter_mut().find(|p| p.id == preset.id) {
                Some(existing) => *existing = preset.clone(),
                None => all.push(preset.clone()),
            }
        }
        self.save_meal_presets(&all)?;
        Ok(presets.len())
    }
}
