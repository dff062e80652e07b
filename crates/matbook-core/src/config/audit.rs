//! Audit logging configuration.

use serde::{Deserialize, Serialize};

/// Configuration for audit logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Where audit events are written.
    #[serde(default)]
    pub sink: SinkKind,

    /// File path (for the file sink).
    #[serde(default)]
    pub file_path: Option<String>,

    /// How field values are compared when computing changes.
    #[serde(default)]
    pub change_detection: ChangeDetection,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sink: SinkKind::default(),
            file_path: None,
            change_detection: ChangeDetection::default(),
        }
    }
}

impl AuditConfig {
    /// File path for the file sink, defaulting to `audit.log`.
    pub fn resolved_file_path(&self) -> &str {
        self.file_path.as_deref().unwrap_or("audit.log")
    }
}

/// Audit sink type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Emit through `tracing` on the `audit` target.
    #[default]
    Tracing,
    /// Print JSON lines to stdout.
    Stdout,
    /// Append JSON lines to a file.
    File,
}

/// Value comparison used for field-level diffs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChangeDetection {
    /// Scalars compare by value; objects and arrays always count as changed.
    #[default]
    Shallow,
    /// Nested values compare by deep equality.
    Structural,
}

fn default_enabled() -> bool {
    true
}
