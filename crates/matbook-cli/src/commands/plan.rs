//! `matbook plan` command implementation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use matbook_billing::{
    BillingService, PlanCatalog, PlanDetails, PlanResolution, SubscriptionSnapshot,
};
use matbook_core::MatbookConfig;
use std::fs;
use std::path::Path;

/// Resolve a snapshot file against the configured catalog.
pub fn resolve(
    config: &MatbookConfig,
    snapshot_path: &Path,
    now: Option<&str>,
) -> Result<PlanDetails> {
    let content = fs::read_to_string(snapshot_path)
        .with_context(|| format!("Failed to read {}", snapshot_path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("{} is not valid JSON", snapshot_path.display()))?;
    let snapshot = SubscriptionSnapshot::from_json(value);

    let now = match now {
        Some(raw) => DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("--now '{}' is not an RFC 3339 timestamp", raw))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };

    let catalog = PlanCatalog::from_config(&config.billing).context("Invalid plan catalog")?;
    let billing = BillingService::new(catalog);

    let resolution = billing.evaluate(snapshot.as_ref(), now);
    if let PlanResolution::Free(reason) = &resolution {
        eprintln!("free plan: {}", reason);
    }
    Ok(billing.plan_details(&resolution, snapshot.as_ref()))
}

pub fn run(config_path: &Path, snapshot_path: &Path, now: Option<&str>) -> Result<()> {
    let config = MatbookConfig::load_or_default(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    let details = resolve(&config, snapshot_path, now)?;
    println!("{}", serde_json::to_string_pretty(&details)?);
    Ok(())
}
