//! `matbook diff` command implementation.

use anyhow::{Context, Result};
use matbook_audit::{Changes, FieldMap, compute_changes_with};
use matbook_core::{ChangeDetection, MatbookConfig};
use serde_json::Value;
use std::fs;
use std::path::Path;

fn read_object(path: &Path) -> Result<FieldMap> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object", path.display()),
    }
}

/// Diff two JSON object files.
pub fn diff_files(
    mode: ChangeDetection,
    before: &Path,
    after: &Path,
    fields: Option<&[String]>,
) -> Result<Option<Changes>> {
    let before = read_object(before)?;
    let after = read_object(after)?;
    let fields: Option<Vec<&str>> =
        fields.map(|fields| fields.iter().map(String::as_str).collect());
    Ok(compute_changes_with(mode, &before, &after, fields.as_deref()))
}

pub fn run(
    config_path: &Path,
    before: &Path,
    after: &Path,
    fields: Option<&[String]>,
    structural: bool,
) -> Result<()> {
    let mode = if structural {
        ChangeDetection::Structural
    } else {
        MatbookConfig::load_or_default(config_path)
            .with_context(|| format!("Failed to load {}", config_path.display()))?
            .audit
            .change_detection
    };

    match diff_files(mode, before, after, fields)? {
        Some(changes) => println!("{}", serde_json::to_string_pretty(&changes)?),
        None => println!("no changes"),
    }
    Ok(())
}
