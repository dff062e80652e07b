//! Configuration types for Matbook.
//!
//! Configuration is loaded from a single YAML file (`matbook.yaml` by
//! default) into a [`MatbookConfig`].
//!
//! # Sections
//!
//! - **server**: bind address for the HTTP surface
//! - **audit**: sink selection and change-detection mode
//! - **billing**: billing environment and the static plan catalog
//! - **cache**: report cache TTL
//! - **logging**: default tracing filter

pub mod audit;
pub mod billing;
pub mod cache;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use audit::{AuditConfig, ChangeDetection, SinkKind};
pub use billing::{
    BillingConfig, BillingEnvironment, BillingInterval, PlanDefinition, PlanId, PlanLimits,
    PlanPrices, PriceIds,
};
pub use cache::CacheConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV_VAR: &str = "MATBOOK_CONFIG";

/// Configuration file used when nothing else is specified.
pub const DEFAULT_CONFIG_FILE: &str = "matbook.yaml";

/// Complete Matbook configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatbookConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Audit logging configuration.
    #[serde(default)]
    pub audit: AuditConfig,

    /// Billing environment and plan catalog.
    #[serde(default)]
    pub billing: BillingConfig,

    /// Report cache configuration.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address, e.g. "0.0.0.0:8080"
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive. `RUST_LOG` takes precedence.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_filter() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MatbookConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    ///
    /// An empty document yields the default configuration.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that parse but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.bind.trim().is_empty() {
            return Err(ConfigError::Config("server.bind is empty".to_string()));
        }
        if matches!(&self.audit.file_path, Some(path) if path.trim().is_empty()) {
            return Err(ConfigError::Config("audit.file_path is empty".to_string()));
        }
        Ok(())
    }

    /// Load from `path` if it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }
}
