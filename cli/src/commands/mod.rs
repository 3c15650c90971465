mod backup;
mod food;
mod helpers;
mod log;
mod preset;
mod profile;
mod summary;

use clap::Args;

use nibble_core::service::NibbleService;
use nibble_core::store::SqliteStore;

pub(crate) use backup::{cmd_export, cmd_import, cmd_reset};
pub(crate) use food::{cmd_food_add, cmd_food_delete, cmd_food_edit, cmd_food_list, cmd_food_show};
pub(crate) use log::{cmd_delete, cmd_edit, cmd_log, cmd_search};
pub(crate) use preset::{
    cmd_preset_create, cmd_preset_delete, cmd_preset_list, cmd_preset_remove_food,
    cmd_preset_servings, cmd_preset_show,
};
pub(crate) use profile::{
    cmd_plan, cmd_profile_set, cmd_profile_show, cmd_settings_set, cmd_settings_show, cmd_setup,
};
pub(crate) use summary::{cmd_summary, cmd_week};

pub(crate) type Service = NibbleService<SqliteStore>;

/// Profile fields shared by `setup` and `profile set`.
#[derive(Args, Debug, Default)]
pub(crate) struct ProfileFields {
    /// male or female
    #[arg(long)]
    pub gender: Option<String>,
    /// Age in years
    #[arg(long)]
    pub age: Option<String>,
    /// Weight in kg (metric) or lbs (imperial)
    #[arg(long)]
    pub weight: Option<String>,
    /// Height in cm (metric) or inches (imperial)
    #[arg(long)]
    pub height: Option<String>,
    /// sedentary, lightly-active, moderately-active, very-active, extremely-active
    #[arg(long)]
    pub activity: Option<String>,
    /// lose, maintain or gain
    #[arg(long)]
    pub goal: Option<String>,
}

/// Custom food fields shared by `food add` and `food edit`.
#[derive(Args, Debug, Default)]
pub(crate) struct FoodFields {
    /// Serving size the nutrition refers to (e.g. "100", "30g", "1 slice")
    #[arg(short, long)]
    pub serving: Option<String>,
    /// Serving unit: grams, ml or units
    #[arg(short, long)]
    pub unit: Option<String>,
    /// Calories per serving
    #[arg(long)]
    pub calories: Option<f64>,
    /// Protein per serving (g, or oz in imperial)
    #[arg(long)]
    pub protein: Option<f64>,
    /// Carbs per serving (g, or oz in imperial)
    #[arg(long)]
    pub carbs: Option<f64>,
    /// Fat per serving (g, or oz in imperial)
    #[arg(long)]
    pub fat: Option<f64>,
    /// Emoji shown next to the food
    #[arg(short, long)]
    pub emoji: Option<String>,
}
