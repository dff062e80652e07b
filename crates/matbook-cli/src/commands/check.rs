//! `matbook check` command implementation.
//!
//! Loads the configuration file, builds the plan catalog and reports
//! settings that parse but are probably not what the operator meant.

use anyhow::Result;
use matbook_billing::PlanCatalog;
use matbook_core::{BillingInterval, MatbookConfig, PlanId, SinkKind};
use std::path::Path;

/// Severity level for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// A single check finding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFinding {
    pub severity: Severity,
    /// Configuration section that produced the finding.
    pub category: &'static str,
    pub message: String,
}

impl CheckFinding {
    fn error(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            category,
            message: message.into(),
        }
    }

    fn warning(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
        }
    }

    fn info(category: &'static str, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            category,
            message: message.into(),
        }
    }
}

/// Check a parsed configuration.
pub fn check_config(config: &MatbookConfig) -> Vec<CheckFinding> {
    let mut findings = Vec::new();
    let billing = &config.billing;

    match PlanCatalog::from_config(billing) {
        Ok(catalog) => findings.push(CheckFinding::info(
            "billing",
            format!(
                "{} plan(s) in the {} environment",
                catalog.plans().len(),
                catalog.environment()
            ),
        )),
        Err(e) => findings.push(CheckFinding::error("billing", e.to_string())),
    }

    for plan in billing.plans.iter().filter(|plan| plan.id != PlanId::Free) {
        let priced = [BillingInterval::Monthly, BillingInterval::Annual]
            .into_iter()
            .any(|interval| plan.prices.price_id(interval, billing.environment).is_some());
        if !priced {
            findings.push(CheckFinding::warning(
                "billing",
                format!(
                    "plan '{}' has no {} price ids and can never be resolved",
                    plan.id, billing.environment
                ),
            ));
        }
    }

    if !config.audit.enabled {
        findings.push(CheckFinding::warning(
            "audit",
            "audit trail is disabled; no events will be recorded",
        ));
    } else if config.audit.sink == SinkKind::File && config.audit.file_path.is_none() {
        findings.push(CheckFinding::info(
            "audit",
            format!(
                "file sink has no file_path, writing to {}",
                config.audit.resolved_file_path()
            ),
        ));
    }

    if config.cache.report_ttl_secs == 0 {
        findings.push(CheckFinding::warning(
            "cache",
            "report_ttl_secs is 0; cached reports are stale immediately",
        ));
    }

    findings
}

fn print_findings(findings: &[CheckFinding]) {
    let mut sorted: Vec<_> = findings.iter().collect();
    sorted.sort_by(|a, b| b.severity.cmp(&a.severity).then(a.category.cmp(b.category)));
    for finding in sorted {
        println!(
            "  [{}] {}: {}",
            finding.severity, finding.category, finding.message
        );
    }
}

/// Run all configuration checks.
pub fn run(config_path: &Path) -> Result<()> {
    println!("Checking {}", config_path.display());

    if !config_path.exists() {
        anyhow::bail!("Configuration file {} not found", config_path.display());
    }

    let config = match MatbookConfig::from_file(config_path) {
        Ok(config) => config,
        Err(e) => {
            print_findings(&[CheckFinding::error("config", e.to_string())]);
            anyhow::bail!("Configuration check failed: the file does not parse");
        }
    };

    let findings = check_config(&config);
    print_findings(&findings);

    let errors = findings
        .iter()
        .filter(|f| f.severity == Severity::Error)
        .count();
    if errors > 0 {
        anyhow::bail!("Configuration check failed with {} error(s)", errors);
    }

    println!("All checks passed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn severities(findings: &[CheckFinding]) -> Vec<(Severity, &'static str)> {
        findings.iter().map(|f| (f.severity, f.category)).collect()
    }

    #[test]
    fn test_default_config_is_clean() {
        let findings = check_config(&MatbookConfig::default());
        assert_eq!(severities(&findings), [(Severity::Info, "billing")]);
    }

    #[test]
    fn test_missing_free_plan_is_an_error() {
        let config = MatbookConfig::from_yaml(
            r#"
billing:
  plans:
    - id: pro
      name: Pro
      prices:
        monthly:
          test: price_test_pro_monthly
"#,
        )
        .unwrap();

        let findings = check_config(&config);
        assert!(findings.contains(&CheckFinding::error(
            "billing",
            matbook_billing::BillingError::MissingFreePlan.to_string()
        )));
    }

    #[test]
    fn test_unpriced_plan_and_disabled_audit_warn() {
        let config = MatbookConfig::from_yaml(
            r#"
audit:
  enabled: false
billing:
  environment: live
  plans:
    - id: free
      name: Free
    - id: starter
      name: Starter
      prices:
        monthly:
          test: price_test_starter_monthly
cache:
  report_ttl_secs: 0
"#,
        )
        .unwrap();

        let findings = check_config(&config);
        let warnings: Vec<_> = findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .map(|f| f.category)
            .collect();
        assert_eq!(warnings, ["billing", "audit", "cache"]);
        assert!(findings[1].message.contains("'starter'"));
    }

    #[test]
    fn test_run_fails_on_unparseable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("matbook.yaml");
        std::fs::write(&path, "audit: [not, a, map]\n").unwrap();
        assert!(run(&path).is_err());

        assert!(run(&dir.path().join("missing.yaml")).is_err());
    }
}
