//! # matbook-audit
//!
//! Compliance audit trail for Matbook.
//!
//! This crate provides:
//! - Write-once [`AuditEvent`]s tagged with a closed set of actions and
//!   entity types
//! - Field-level diffs between an entity's current state and a partial
//!   update ([`compute_changes`])
//! - Sinks that receive each event at info (success) or warn (failure)
//!   severity
//!
//! ## Message Format
//!
//! ```text
//! [AUDIT] member.updateContact on member:mem_42 by user:usr_1 in org:org_9
//! [AUDIT] FAILED membership.create on membership by user:usr_1 in org:org_9: card declined
//! ```
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use matbook_audit::{AuditAction, AuditContext, AuditEntityType, AuditService, RecordOptions};
//! use matbook_core::AuditConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let service = AuditService::from_config(&AuditConfig::default())?;
//! let context = AuditContext::new("usr_1", "org_9")?.with_role("owner");
//!
//! service
//!     .record(
//!         &context,
//!         AuditAction::MemberCreate,
//!         AuditEntityType::Member,
//!         RecordOptions::success().entity_id("mem_42"),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod changes;
pub mod error;
pub mod event;
pub mod service;
pub mod sink;

pub use changes::{FieldMap, compute_changes, compute_changes_with, to_fields};
pub use error::AuditError;
pub use event::{
    AuditAction, AuditEntityType, AuditEvent, AuditEventBuilder, AuditStatus, Changes, FieldChange,
};
pub use service::{AuditContext, AuditService, RecordOptions};
pub use sink::{
    AuditPayload, AuditSink, JsonLinesSink, MemorySink, NullSink, SinkLevel, SinkLine,
    SinkRecord, StdoutSink, TracingSink, create_sink,
};
