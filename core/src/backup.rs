use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use serde_json::Value;

use crate::models::{ExportData, ImportData};

pub const BACKUP_VERSION: &str = "1.0";

const REQUIRED_SECTIONS: [&str; 2] = ["profileData", "appData"];

/// Parse a backup document. Profile and app settings must be present; every
/// other section is optional.
pub fn parse_backup(json: &str) -> Result<ImportData> {
    let value: Value = serde_json::from_str(json).context("Backup is not valid JSON")?;
    if !value.is_object() {
        bail!("Invalid backup file format: expected a JSON object");
    }
    for section in REQUIRED_SECTIONS {
        if value.get(section).is_none_or(Value::is_null) {
            bail!("Invalid backup file format: missing {section}");
        }
    }
    if let Some(version) = value.get("version").and_then(Value::as_str) {
        if version != BACKUP_VERSION {
            tracing::warn!(
                version,
                "backup version differs from {BACKUP_VERSION}, importing anyway"
            );
        }
    }
    serde_json::from_value(value).context("Invalid backup file format")
}

pub fn to_json(data: &ExportData) -> Result<String> {
    serde_json::to_string_pretty(data).context("Failed to serialize backup")
}

#[must_use]
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("nibble_backup_{}.json", date.format("%Y-%m-%d"))
}
