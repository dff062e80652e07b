//! Audit sinks.
//!
//! A sink receives exactly one call per recorded event, at info severity
//! for successes and warn severity for failures. Sinks report their own
//! failures; nothing here retries or swallows errors.

use async_trait::async_trait;
use matbook_core::{AuditConfig, SinkKind};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};

use crate::error::AuditError;
use crate::event::AuditEvent;

/// Structured payload handed to a sink: `{"audit": <event>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPayload {
    pub audit: AuditEvent,
}

/// Severity a sink call was made at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkLevel {
    Info,
    Warn,
}

impl std::fmt::Display for SinkLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warn => write!(f, "WARN"),
        }
    }
}

/// Trait for audit sinks.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Emit at info severity.
    async fn info(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError>;

    /// Emit at warn severity.
    async fn warn(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError>;
}

/// Create a sink based on configuration.
pub fn create_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, AuditError> {
    if !config.enabled {
        return Ok(Arc::new(NullSink));
    }
    match config.sink {
        SinkKind::Tracing => Ok(Arc::new(TracingSink)),
        SinkKind::Stdout => Ok(Arc::new(StdoutSink)),
        SinkKind::File => Ok(Arc::new(JsonLinesSink::open(config.resolved_file_path())?)),
    }
}

/// One line of JSON-lines output.
#[derive(Debug, Serialize, Deserialize)]
pub struct SinkLine {
    pub level: SinkLevel,
    pub message: String,
    pub audit: AuditEvent,
}

fn to_line(level: SinkLevel, message: &str, payload: &AuditPayload) -> Result<String, AuditError> {
    #[derive(Serialize)]
    struct Line<'a> {
        level: SinkLevel,
        message: &'a str,
        audit: &'a AuditEvent,
    }

    Ok(serde_json::to_string(&Line {
        level,
        message,
        audit: &payload.audit,
    })?)
}

/// Discards every event. Used when auditing is disabled.
pub struct NullSink;

#[async_trait]
impl AuditSink for NullSink {
    async fn info(&self, _message: &str, _payload: &AuditPayload) -> Result<(), AuditError> {
        Ok(())
    }

    async fn warn(&self, _message: &str, _payload: &AuditPayload) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Emits through `tracing` on the `audit` target.
pub struct TracingSink;

#[async_trait]
impl AuditSink for TracingSink {
    async fn info(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        let audit = serde_json::to_string(payload)?;
        tracing::info!(target: "audit", audit = %audit, "{}", message);
        Ok(())
    }

    async fn warn(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        let audit = serde_json::to_string(payload)?;
        tracing::warn!(target: "audit", audit = %audit, "{}", message);
        Ok(())
    }
}

/// Prints JSON lines to stdout.
pub struct StdoutSink;

#[async_trait]
impl AuditSink for StdoutSink {
    async fn info(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        println!("{}", to_line(SinkLevel::Info, message, payload)?);
        Ok(())
    }

    async fn warn(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        println!("{}", to_line(SinkLevel::Warn, message, payload)?);
        Ok(())
    }
}

/// Appends JSON lines to a file.
pub struct JsonLinesSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesSink {
    /// Open (or create) the file for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|e| {
                AuditError::InitializationFailed(format!("{}: {}", path.display(), e))
            })?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: String) -> Result<(), AuditError> {
        let mut file = self
            .file
            .lock()
            .map_err(|e| AuditError::SinkFailed(format!("audit file lock poisoned: {}", e)))?;
        writeln!(file, "{}", line)?;
        file.flush()?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for JsonLinesSink {
    async fn info(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        self.append(to_line(SinkLevel::Info, message, payload)?)
    }

    async fn warn(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        self.append(to_line(SinkLevel::Warn, message, payload)?)
    }
}

/// A captured sink call.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkRecord {
    pub level: SinkLevel,
    pub message: String,
    pub payload: AuditPayload,
}

/// Keeps every call in memory.
#[derive(Default)]
pub struct MemorySink {
    records: RwLock<Vec<SinkRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the calls received so far.
    pub fn records(&self) -> Vec<SinkRecord> {
        match self.records.read() {
            Ok(records) => records.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.records().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, level: SinkLevel, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        let mut records = self
            .records
            .write()
            .map_err(|e| AuditError::SinkFailed(format!("failed to acquire write lock: {}", e)))?;
        records.push(SinkRecord {
            level,
            message: message.to_string(),
            payload: payload.clone(),
        });
        Ok(())
    }
}

#[async_trait]
impl AuditSink for MemorySink {
    async fn info(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        self.push(SinkLevel::Info, message, payload)
    }

    async fn warn(&self, message: &str, payload: &AuditPayload) -> Result<(), AuditError> {
        self.push(SinkLevel::Warn, message, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{AuditAction, AuditEntityType, AuditStatus};

    fn payload() -> AuditPayload {
        AuditPayload {
            audit: AuditEvent::builder(
                "u1",
                "o1",
                AuditAction::ClassCreate,
                AuditEntityType::Class,
                AuditStatus::Success,
            )
            .entity_id("cls_1")
            .build()
            .unwrap(),
        }
    }

    #[tokio::test]
    async fn test_memory_sink_captures_level() {
        let sink = MemorySink::new();
        let payload = payload();

        sink.info("first", &payload).await.unwrap();
        sink.warn("second", &payload).await.unwrap();

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].level, SinkLevel::Info);
        assert_eq!(records[1].level, SinkLevel::Warn);
        assert_eq!(records[1].message, "second");
    }

    #[tokio::test]
    async fn test_json_lines_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.log");
        let sink = JsonLinesSink::open(&path).unwrap();
        let payload = payload();

        sink.info("created", &payload).await.unwrap();
        sink.warn("failed", &payload).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<SinkLine> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].level, SinkLevel::Info);
        assert_eq!(lines[0].message, "created");
        assert_eq!(lines[1].level, SinkLevel::Warn);
        assert_eq!(lines[1].audit, payload.audit);
    }

    #[tokio::test]
    async fn test_tracing_and_null_sinks_accept_events() {
        let payload = payload();
        TracingSink.info("ok", &payload).await.unwrap();
        NullSink.warn("ok", &payload).await.unwrap();
    }

    #[test]
    fn test_create_sink_respects_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = AuditConfig {
            sink: SinkKind::File,
            file_path: Some(dir.path().join("a.log").display().to_string()),
            ..Default::default()
        };
        assert!(create_sink(&config).is_ok());
        assert!(dir.path().join("a.log").exists());

        let disabled = AuditConfig {
            enabled: false,
            sink: SinkKind::File,
            file_path: Some(dir.path().join("b.log").display().to_string()),
            ..Default::default()
        };
        assert!(create_sink(&disabled).is_ok());
        assert!(!dir.path().join("b.log").exists());
    }
}
