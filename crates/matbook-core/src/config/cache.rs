//! Report cache configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the report cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long a cached report stays fresh, in seconds.
    #[serde(default = "default_report_ttl_secs")]
    pub report_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            report_ttl_secs: default_report_ttl_secs(),
        }
    }
}

impl CacheConfig {
    pub fn report_ttl(&self) -> Duration {
        Duration::from_secs(self.report_ttl_secs)
    }
}

fn default_report_ttl_secs() -> u64 {
    300
}
