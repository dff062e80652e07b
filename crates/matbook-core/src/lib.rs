//! # matbook-core
//!
//! Configuration types shared across all Matbook crates.
//!
//! The whole workspace is driven by a single [`MatbookConfig`], normally
//! loaded from `matbook.yaml`. Each section has serde defaults so an empty
//! file is a valid configuration.

pub mod config;

pub use config::{
    AuditConfig, BillingConfig, BillingEnvironment, BillingInterval, CONFIG_ENV_VAR,
    CacheConfig, ChangeDetection, ConfigError, DEFAULT_CONFIG_FILE, LoggingConfig,
    MatbookConfig, PlanDefinition, PlanId, PlanLimits, PlanPrices, PriceIds, ServerConfig,
    SinkKind,
};
