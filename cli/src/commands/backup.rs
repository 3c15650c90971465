use anyhow::{Context, Result, bail};
use chrono::Local;
use std::path::{Path, PathBuf};

use nibble_core::backup::{backup_file_name, parse_backup, to_json};
use nibble_core::models::ImportSummary;

use super::Service;
use super::helpers::print_json;
use crate::config::Config;

fn default_backup_path(data_dir: &Path) -> PathBuf {
    data_dir.join(backup_file_name(Local::now().date_naive()))
}

pub(crate) fn cmd_export(
    svc: &Service,
    config: &Config,
    output: Option<String>,
    stdout: bool,
    json: bool,
) -> Result<()> {
    let data = svc.export_all();
    let document = to_json(&data)?;

    if stdout {
        println!("{document}");
        return Ok(());
    }

    let path = output.map_or_else(|| default_backup_path(&config.data_dir), PathBuf::from);
    std::fs::write(&path, &document)
        .with_context(|| format!("Failed to write backup to {}", path.display()))?;
    tracing::info!(path = %path.display(), "backup written");

    if json {
        print_json(&serde_json::json!({
            "path": path.display().to_string(),
            "daily_meals": data.daily_meals.len(),
            "custom_foods": data.custom_foods.len(),
            "meal_presets": data.meal_presets.len(),
        }))
    } else {
        println!("Backup written to {}", path.display());
        println!(
            "  {} meal entries, {} custom foods, {} meal presets",
            data.daily_meals.len(),
            data.custom_foods.len(),
            data.meal_presets.len()
        );
        Ok(())
    }
}

fn print_import_summary(summary: &ImportSummary) {
    println!("Import complete.");
    if summary.profile_imported {
        println!("  Profile and settings restored");
    }
    let dates = summary.meal_dates_replaced;
    let entries = summary.meal_entries_imported;
    println!("  {entries} meal entries across {dates} days");
    println!("  {} custom foods", summary.custom_foods_imported);
    println!("  {} meal presets", summary.meal_presets_imported);
}

pub(crate) fn cmd_import(svc: &Service, file: &str, json: bool) -> Result<()> {
    let contents =
        std::fs::read_to_string(file).with_context(|| format!("Failed to read backup {file}"))?;
    let data = parse_backup(&contents)?;
    let summary = svc.import_all(&data)?;

    if json {
        print_json(&summary)
    } else {
        print_import_summary(&summary);
        Ok(())
    }
}

pub(crate) fn cmd_reset(svc: &Service, yes: bool, json: bool) -> Result<()> {
    if !yes {
        bail!("This deletes your profile, meals, custom foods and presets. Re-run with --yes");
    }
    svc.clear_all_data()?;
    if json {
        print_json(&serde_json::json!({ "cleared": true }))
    } else {
        println!("All data cleared. Run `nibble setup` to start again.");
        Ok(())
    }
}
