mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;
use tracing_subscriber::EnvFilter;

use crate::commands::{
    FoodFields, ProfileFields, cmd_delete, cmd_edit, cmd_export, cmd_food_add, cmd_food_delete,
    cmd_food_edit, cmd_food_list, cmd_food_show, cmd_import, cmd_log, cmd_plan,
    cmd_preset_create, cmd_preset_delete, cmd_preset_list, cmd_preset_remove_food,
    cmd_preset_servings, cmd_preset_show, cmd_profile_set, cmd_profile_show, cmd_reset,
    cmd_search, cmd_settings_set, cmd_settings_show, cmd_setup, cmd_summary, cmd_week,
};
use crate::config::Config;
use nibble_core::service::NibbleService;

#[derive(Parser)]
#[command(
    name = "nibble",
    version,
    about = "A local-first calorie tracker",
    long_about = "Track what you eat against a daily calorie and macro plan derived from your body metrics. All data stays in a local database."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// First-run setup: body metrics, goal and unit system
    Setup {
        #[command(flatten)]
        profile: ProfileFields,
        /// Unit system for weight/height: metric or imperial
        #[arg(long, default_value = "metric")]
        units: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show or change body metrics and goal
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Show or change unit system and BMR formula
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },
    /// Show BMR, TDEE, calorie goal and macro targets
    Plan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Search built-in and custom foods
    Search {
        /// Name filter (default: list everything)
        query: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a food by ID (see `search`)
    Log {
        /// Food ID, e.g. "2" or "custom_<id>"
        food_id: String,
        /// Amount in grams/ounces/ml, or number of units
        amount: f64,
        /// Meal type: breakfast, lunch, dinner, snacks
        #[arg(short, long, default_value = "snacks")]
        meal: String,
        /// Date to log for (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one day's entries and remaining budget (defaults to today)
    Summary {
        /// Date to show (YYYY-MM-DD, default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show Monday-to-Sunday calories for the week containing a date
    Week {
        /// Any date in the week (default: today)
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a meal entry's amount, meal type or date
    Edit {
        /// Entry ID
        entry_id: String,
        /// New amount (rescales calories and macros)
        #[arg(short, long)]
        amount: Option<f64>,
        /// New meal type: breakfast, lunch, dinner, snacks
        #[arg(long)]
        meal: Option<String>,
        /// New date (YYYY-MM-DD or today/yesterday/tomorrow)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal entry by ID
    Delete {
        /// Entry ID to delete
        entry_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage custom foods
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Manage meal presets
    Preset {
        #[command(subcommand)]
        command: PresetCommands,
    },
    /// Write a JSON backup of all data
    Export {
        /// Output file (default: backup file in the data directory)
        #[arg(short, long)]
        output: Option<String>,
        /// Print the backup document to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Restore data from a JSON backup
    Import {
        /// Backup file to read
        file: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete all stored data
    Reset {
        /// Skip the confirmation check
        #[arg(long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the stored profile
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change one or more profile fields
    Set {
        #[command(flatten)]
        profile: ProfileFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum SettingsCommands {
    /// Show unit system and BMR formula
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change unit system and/or BMR formula
    Set {
        /// metric or imperial (converts stored weight and height)
        #[arg(long)]
        units: Option<String>,
        /// mifflin-st-jeor, harris-benedict, katch-mcardle, cunningham
        #[arg(long)]
        formula: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// Create a custom food
    Add {
        /// Food name
        name: String,
        #[command(flatten)]
        fields: FoodFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List custom foods
    List {
        /// Filter by name
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one custom food
    Show {
        /// Custom food ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a custom food
    Edit {
        /// Custom food ID
        id: String,
        /// New name
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: FoodFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a custom food (meal presets keep their copy)
    Delete {
        /// Custom food ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PresetCommands {
    /// Create a meal preset from foods
    Create {
        /// Preset name
        name: String,
        /// Food and amount as "ID:AMOUNT", repeatable (e.g. --food 2:150 --food 1:1)
        #[arg(short, long = "food", required = true)]
        foods: Vec<String>,
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Emoji
        #[arg(short, long, default_value = "🍽️")]
        emoji: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List meal presets
    List {
        /// Filter by name
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a preset and its foods
    Show {
        /// Preset ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Set the servings of one food in a preset
    Servings {
        /// Preset ID
        preset_id: String,
        /// Preset food ID (see `preset show`)
        food_id: String,
        /// New number of servings
        servings: f64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a food from a preset
    Remove {
        /// Preset ID
        preset_id: String,
        /// Preset food ID (see `preset show`)
        food_id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal preset
    Delete {
        /// Preset ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("NIBBLE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let svc = NibbleService::open(&config.db_path)?;

    match cli.command {
        Commands::Setup {
            profile,
            units,
            json,
        } => cmd_setup(&svc, &profile, &units, json),
        Commands::Profile { command } => match command {
            ProfileCommands::Show { json } => cmd_profile_show(&svc, json),
            ProfileCommands::Set { profile, json } => cmd_profile_set(&svc, &profile, json),
        },
        Commands::Settings { command } => match command {
            SettingsCommands::Show { json } => cmd_settings_show(&svc, json),
            SettingsCommands::Set {
                units,
                formula,
                json,
            } => cmd_settings_set(&svc, units.as_deref(), formula.as_deref(), json),
        },
        Commands::Plan { json } => cmd_plan(&svc, json),
        Commands::Search { query, json } => cmd_search(&svc, query.as_deref(), json),
        Commands::Log {
            food_id,
            amount,
            meal,
            date,
            json,
        } => cmd_log(&svc, &food_id, amount, &meal, date, json),
        Commands::Summary { date, json } => cmd_summary(&svc, date, json),
        Commands::Week { date, json } => cmd_week(&svc, date, json),
        Commands::Edit {
            entry_id,
            amount,
            meal,
            date,
            json,
        } => cmd_edit(&svc, &entry_id, amount, meal.as_deref(), date, json),
        Commands::Delete { entry_id, json } => cmd_delete(&svc, &entry_id, json),
        Commands::Food { command } => match command {
            FoodCommands::Add { name, fields, json } => cmd_food_add(&svc, &name, &fields, json),
            FoodCommands::List { search, json } => cmd_food_list(&svc, search.as_deref(), json),
            FoodCommands::Show { id, json } => cmd_food_show(&svc, &id, json),
            FoodCommands::Edit {
                id,
                name,
                fields,
                json,
            } => cmd_food_edit(&svc, &id, name, &fields, json),
            FoodCommands::Delete { id, json } => cmd_food_delete(&svc, &id, json),
        },
        Commands::Preset { command } => match command {
            PresetCommands::Create {
                name,
                foods,
                description,
                emoji,
                json,
            } => cmd_preset_create(&svc, &name, &foods, &description, &emoji, json),
            PresetCommands::List { search, json } => {
                cmd_preset_list(&svc, search.as_deref(), json)
            }
            PresetCommands::Show { id, json } => cmd_preset_show(&svc, &id, json),
            PresetCommands::Servings {
                preset_id,
                food_id,
                servings,
                json,
            } => cmd_preset_servings(&svc, &preset_id, &food_id, servings, json),
            PresetCommands::Remove {
                preset_id,
                food_id,
                json,
            } => cmd_preset_remove_food(&svc, &preset_id, &food_id, json),
            PresetCommands::Delete { id, json } => cmd_preset_delete(&svc, &id, json),
        },
        Commands::Export {
            output,
            stdout,
            json,
        } => cmd_export(&svc, &config, output, stdout, json),
        Commands::Import { file, json } => cmd_import(&svc, &file, json),
        Commands::Reset { yes, json } => cmd_reset(&svc, yes, json),
    }
}
