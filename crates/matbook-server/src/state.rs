//! Shared application state.

use matbook_audit::AuditService;
use matbook_billing::{BillingService, PlanCatalog};
use matbook_cache::{NoReportSource, ReportCache, ReportSource};
use matbook_core::MatbookConfig;
use std::sync::Arc;

/// Shared application state for the HTTP surface.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    audit: AuditService,
    billing: BillingService,
    reports: ReportCache<serde_json::Value>,
    report_source: Arc<dyn ReportSource<serde_json::Value>>,
}

impl AppState {
    pub fn new(
        audit: AuditService,
        billing: BillingService,
        reports: ReportCache<serde_json::Value>,
        report_source: Arc<dyn ReportSource<serde_json::Value>>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                audit,
                billing,
                reports,
                report_source,
            }),
        }
    }

    /// Build every service from configuration.
    ///
    /// No report backend is wired in; report reads answer 503 until a
    /// source is supplied through [`AppState::new`].
    ///
    /// Fails when the audit sink cannot be opened or the plan catalog is
    /// invalid (e.g. no free plan).
    pub fn from_config(config: &MatbookConfig) -> anyhow::Result<Self> {
        let audit = AuditService::from_config(&config.audit)?;
        let catalog = PlanCatalog::from_config(&config.billing)?;
        tracing::info!(
            environment = %catalog.environment(),
            plans = catalog.plans().len(),
            "Loaded plan catalog"
        );
        Ok(Self::new(
            audit,
            BillingService::new(catalog),
            ReportCache::new(&config.cache),
            Arc::new(NoReportSource),
        ))
    }

    pub fn audit(&self) -> &AuditService {
        &self.inner.audit
    }

    pub fn billing(&self) -> &BillingService {
        &self.inner.billing
    }

    pub fn reports(&self) -> &ReportCache<serde_json::Value> {
        &self.inner.reports
    }

    pub fn report_source(&self) -> &dyn ReportSource<serde_json::Value> {
        self.inner.report_source.as_ref()
    }
}
