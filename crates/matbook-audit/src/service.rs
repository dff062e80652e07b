//! Audit service.
//!
//! [`AuditService::record`] turns an authenticated context plus an action
//! outcome into one [`AuditEvent`] and hands it to the configured sink.

use matbook_core::{AuditConfig, ChangeDetection};
use std::sync::Arc;

use crate::changes::{FieldMap, compute_changes_with};
use crate::error::AuditError;
use crate::event::{
    AuditAction, AuditEntityType, AuditEvent, AuditStatus, Changes, require_id,
};
use crate::sink::{AuditPayload, AuditSink, NullSink, create_sink};

/// Who performed an action, and in which organization.
///
/// Built by the router layer from an already authenticated request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditContext {
    user_id: String,
    org_id: String,
    role: Option<String>,
}

impl AuditContext {
    /// Both ids must be non-empty.
    pub fn new(user_id: impl Into<String>, org_id: impl Into<String>) -> Result<Self, AuditError> {
        let user_id = user_id.into();
        let org_id = org_id.into();
        require_id("user", &user_id)?;
        require_id("org", &org_id)?;
        Ok(Self {
            user_id,
            org_id,
            role: None,
        })
    }

    /// Snapshot the actor's current role.
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// Outcome and optional metadata for one recorded event.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordOptions {
    pub status: AuditStatus,
    pub entity_id: Option<String>,
    pub changes: Option<Changes>,
    pub error: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub request_id: Option<String>,
}

impl RecordOptions {
    pub fn new(status: AuditStatus) -> Self {
        Self {
            status,
            entity_id: None,
            changes: None,
            error: None,
            ip_address: None,
            user_agent: None,
            request_id: None,
        }
    }

    pub fn success() -> Self {
        Self::new(AuditStatus::Success)
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::new(AuditStatus::Failure).error(error)
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    pub fn changes(mut self, changes: Option<Changes>) -> Self {
        self.changes = changes;
        self
    }

    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// The audit service.
#[derive(Clone)]
pub struct AuditService {
    sink: Arc<dyn AuditSink>,
    change_detection: ChangeDetection,
}

impl AuditService {
    /// Create a service writing to `sink`.
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self {
            sink,
            change_detection: ChangeDetection::default(),
        }
    }

    /// Create a service from configuration.
    pub fn from_config(config: &AuditConfig) -> Result<Self, AuditError> {
        Ok(Self {
            sink: create_sink(config)?,
            change_detection: config.change_detection,
        })
    }

    /// Create a disabled (no-op) service.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NullSink))
    }

    pub fn with_change_detection(mut self, mode: ChangeDetection) -> Self {
        self.change_detection = mode;
        self
    }

    pub fn change_detection(&self) -> ChangeDetection {
        self.change_detection
    }

    /// Record one event.
    ///
    /// Successes go to the sink at info severity, failures at warn. Sink
    /// errors are returned unchanged.
    pub async fn record(
        &self,
        context: &AuditContext,
        action: AuditAction,
        entity_type: AuditEntityType,
        options: RecordOptions,
    ) -> Result<(), AuditError> {
        let mut builder = AuditEvent::builder(
            context.user_id(),
            context.org_id(),
            action,
            entity_type,
            options.status,
        );

        if let Some(role) = context.role() {
            builder = builder.role(role);
        }
        if let Some(id) = options.entity_id {
            builder = builder.entity_id(id);
        }
        if let Some(changes) = options.changes {
            builder = builder.changes(changes);
        }
        if let Some(error) = options.error {
            builder = builder.error(error);
        }
        if let Some(ip) = options.ip_address {
            builder = builder.ip_address(ip);
        }
        if let Some(user_agent) = options.user_agent {
            builder = builder.user_agent(user_agent);
        }
        if let Some(id) = options.request_id {
            builder = builder.request_id(id);
        }

        let event = builder.build()?;
        let message = event.to_log_message();

        tracing::debug!(
            event_id = %event.event_id(),
            action = %event.action(),
            entity_type = %event.entity_type(),
            org = %event.org_id(),
            user = %event.user_id(),
            status = %event.status(),
            "Audit event"
        );

        let status = event.status();
        let payload = AuditPayload { audit: event };
        match status {
            AuditStatus::Success => self.sink.info(&message, &payload).await,
            AuditStatus::Failure => self.sink.warn(&message, &payload).await,
        }
    }

    /// Compute changes with this service's comparison mode.
    pub fn compute_changes(
        &self,
        before: &FieldMap,
        after: &FieldMap,
        fields: Option<&[&str]>,
    ) -> Option<Changes> {
        compute_changes_with(self.change_detection, before, after, fields)
    }

    /// Record a successful update carrying its field-level diff.
    ///
    /// The event is recorded even when nothing changed, without a
    /// `changes` payload. Returns the changes that were attached.
    #[allow(clippy::too_many_arguments)]
    pub async fn record_update(
        &self,
        context: &AuditContext,
        action: AuditAction,
        entity_type: AuditEntityType,
        entity_id: &str,
        before: &FieldMap,
        after: &FieldMap,
        fields: Option<&[&str]>,
    ) -> Result<Option<Changes>, AuditError> {
        let changes = self.compute_changes(before, after, fields);
        let options = RecordOptions::success()
            .entity_id(entity_id)
            .changes(changes.clone());
        self.record(context, action, entity_type, options).await?;
        Ok(changes)
    }
}
