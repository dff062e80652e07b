//! Error types for the audit crate.

use thiserror::Error;

/// Errors that can occur during audit operations.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The actor context is missing a required identity.
    #[error("invalid audit context: {0}")]
    InvalidContext(String),

    /// A string did not name a known action or entity type.
    #[error("unknown audit tag: {0}")]
    UnknownTag(String),

    /// A value could not be lowered to a field map.
    #[error("expected an object of fields, got {0}")]
    NotAnObject(&'static str),

    /// Failed to initialize a sink.
    #[error("failed to initialize audit sink: {0}")]
    InitializationFailed(String),

    /// The sink rejected the event.
    #[error("audit sink failed: {0}")]
    SinkFailed(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
