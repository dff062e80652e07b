//! Where cache misses are filled from.

use async_trait::async_trait;
use thiserror::Error;

use crate::report::ReportKey;

/// Errors from a [`ReportSource`].
#[derive(Debug, Error)]
pub enum ReportError {
    /// No backend can compute this report.
    #[error("report unavailable: {0}")]
    Unavailable(String),

    /// The backend tried and failed.
    #[error("report failed: {0}")]
    Failed(String),
}

/// Computes a report payload on a cache miss.
#[async_trait]
pub trait ReportSource<V>: Send + Sync {
    async fn fetch(&self, key: &ReportKey) -> Result<V, ReportError>;
}

/// Source for deployments with no report backend wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoReportSource;

#[async_trait]
impl<V: Send + 'static> ReportSource<V> for NoReportSource {
    async fn fetch(&self, key: &ReportKey) -> Result<V, ReportError> {
        Err(ReportError::Unavailable(format!(
            "no source configured for {:?} reports",
            key.report
        )))
    }
}
