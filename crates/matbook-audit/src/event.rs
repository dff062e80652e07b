//! Audit event types.
//!
//! An [`AuditEvent`] is a write-once record of one compliance-relevant
//! action. Events are only built through [`AuditEventBuilder`] and expose
//! their fields through accessors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AuditError;

/// Kind of entity an action touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditEntityType {
    Member,
    Membership,
    Class,
    Program,
    Waiver,
    Staff,
    Billing,
    Organization,
    Report,
}

impl AuditEntityType {
    pub const ALL: [AuditEntityType; 9] = [
        Self::Member,
        Self::Membership,
        Self::Class,
        Self::Program,
        Self::Waiver,
        Self::Staff,
        Self::Billing,
        Self::Organization,
        Self::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Membership => "membership",
            Self::Class => "class",
            Self::Program => "program",
            Self::Waiver => "waiver",
            Self::Staff => "staff",
            Self::Billing => "billing",
            Self::Organization => "organization",
            Self::Report => "report",
        }
    }
}

impl std::fmt::Display for AuditEntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditEntityType {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AuditError::UnknownTag(s.to_string()))
    }
}

/// An `entity.operation` action tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    // ===== Members =====
    #[serde(rename = "member.create")]
    MemberCreate,
    #[serde(rename = "member.update")]
    MemberUpdate,
    #[serde(rename = "member.updateContact")]
    MemberUpdateContact,
    #[serde(rename = "member.archive")]
    MemberArchive,
    #[serde(rename = "member.delete")]
    MemberDelete,

    // ===== Memberships =====
    #[serde(rename = "membership.create")]
    MembershipCreate,
    #[serde(rename = "membership.update")]
    MembershipUpdate,
    #[serde(rename = "membership.cancel")]
    MembershipCancel,
    #[serde(rename = "membership.freeze")]
    MembershipFreeze,

    // ===== Classes and programs =====
    #[serde(rename = "class.create")]
    ClassCreate,
    #[serde(rename = "class.update")]
    ClassUpdate,
    #[serde(rename = "class.delete")]
    ClassDelete,
    #[serde(rename = "program.create")]
    ProgramCreate,
    #[serde(rename = "program.update")]
    ProgramUpdate,
    #[serde(rename = "program.delete")]
    ProgramDelete,

    // ===== Waivers =====
    #[serde(rename = "waiver.create")]
    WaiverCreate,
    #[serde(rename = "waiver.sign")]
    WaiverSign,
    #[serde(rename = "waiver.revoke")]
    WaiverRevoke,

    // ===== Staff =====
    #[serde(rename = "staff.invite")]
    StaffInvite,
    #[serde(rename = "staff.updateRole")]
    StaffUpdateRole,
    #[serde(rename = "staff.remove")]
    StaffRemove,

    // ===== Billing and organization =====
    #[serde(rename = "billing.checkout")]
    BillingCheckout,
    #[serde(rename = "billing.subscriptionUpdate")]
    BillingSubscriptionUpdate,
    #[serde(rename = "billing.cancel")]
    BillingCancel,
    #[serde(rename = "organization.update")]
    OrganizationUpdate,
    #[serde(rename = "report.export")]
    ReportExport,
}

impl AuditAction {
    pub const ALL: [AuditAction; 26] = [
        Self::MemberCreate,
        Self::MemberUpdate,
        Self::MemberUpdateContact,
        Self::MemberArchive,
        Self::MemberDelete,
        Self::MembershipCreate,
        Self::MembershipUpdate,
        Self::MembershipCancel,
        Self::MembershipFreeze,
        Self::ClassCreate,
        Self::ClassUpdate,
        Self::ClassDelete,
        Self::ProgramCreate,
        Self::ProgramUpdate,
        Self::ProgramDelete,
        Self::WaiverCreate,
        Self::WaiverSign,
        Self::WaiverRevoke,
        Self::StaffInvite,
        Self::StaffUpdateRole,
        Self::StaffRemove,
        Self::BillingCheckout,
        Self::BillingSubscriptionUpdate,
        Self::BillingCancel,
        Self::OrganizationUpdate,
        Self::ReportExport,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MemberCreate => "member.create",
            Self::MemberUpdate => "member.update",
            Self::MemberUpdateContact => "member.updateContact",
            Self::MemberArchive => "member.archive",
            Self::MemberDelete => "member.delete",
            Self::MembershipCreate => "membership.create",
            Self::MembershipUpdate => "membership.update",
            Self::MembershipCancel => "membership.cancel",
            Self::MembershipFreeze => "membership.freeze",
            Self::ClassCreate => "class.create",
            Self::ClassUpdate => "class.update",
            Self::ClassDelete => "class.delete",
            Self::ProgramCreate => "program.create",
            Self::ProgramUpdate => "program.update",
            Self::ProgramDelete => "program.delete",
            Self::WaiverCreate => "waiver.create",
            Self::WaiverSign => "waiver.sign",
            Self::WaiverRevoke => "waiver.revoke",
            Self::StaffInvite => "staff.invite",
            Self::StaffUpdateRole => "staff.updateRole",
            Self::StaffRemove => "staff.remove",
            Self::BillingCheckout => "billing.checkout",
            Self::BillingSubscriptionUpdate => "billing.subscriptionUpdate",
            Self::BillingCancel => "billing.cancel",
            Self::OrganizationUpdate => "organization.update",
            Self::ReportExport => "report.export",
        }
    }

    /// The entity type named by the action's prefix.
    pub fn entity_type(&self) -> AuditEntityType {
        match self {
            Self::MemberCreate
            | Self::MemberUpdate
            | Self::MemberUpdateContact
            | Self::MemberArchive
            | Self::MemberDelete => AuditEntityType::Member,
            Self::MembershipCreate
            | Self::MembershipUpdate
            | Self::MembershipCancel
            | Self::MembershipFreeze => AuditEntityType::Membership,
            Self::ClassCreate | Self::ClassUpdate | Self::ClassDelete => AuditEntityType::Class,
            Self::ProgramCreate | Self::ProgramUpdate | Self::ProgramDelete => {
                AuditEntityType::Program
            }
            Self::WaiverCreate | Self::WaiverSign | Self::WaiverRevoke => AuditEntityType::Waiver,
            Self::StaffInvite | Self::StaffUpdateRole | Self::StaffRemove => AuditEntityType::Staff,
            Self::BillingCheckout | Self::BillingSubscriptionUpdate | Self::BillingCancel => {
                AuditEntityType::Billing
            }
            Self::OrganizationUpdate => AuditEntityType::Organization,
            Self::ReportExport => AuditEntityType::Report,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuditAction {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| AuditError::UnknownTag(s.to_string()))
    }
}

/// Outcome of the audited operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditStatus {
    Success,
    Failure,
}

impl std::fmt::Display for AuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Before/after pair for one changed field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub before: serde_json::Value,
    pub after: serde_json::Value,
}

/// Field name to change, ordered by field name.
pub type Changes = BTreeMap<String, FieldChange>;

/// Reject an empty or blank actor or tenant id.
pub(crate) fn require_id(kind: &str, value: &str) -> Result<(), AuditError> {
    if value.trim().is_empty() {
        return Err(AuditError::InvalidContext(format!("{} id is empty", kind)));
    }
    Ok(())
}

/// An audit event.
///
/// Deserialized events go through the same id checks as
/// [`AuditEventBuilder::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredAuditEvent")]
pub struct AuditEvent {
    event_id: Uuid,
    user_id: String,
    org_id: String,
    action: AuditAction,
    entity_type: AuditEntityType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    entity_id: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    status: AuditStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    changes: Option<Changes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user_agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

/// Wire form of an [`AuditEvent`] before validation.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredAuditEvent {
    event_id: Uuid,
    user_id: String,
    org_id: String,
    action: AuditAction,
    entity_type: AuditEntityType,
    #[serde(default)]
    entity_id: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    role: Option<String>,
    status: AuditStatus,
    #[serde(default)]
    changes: Option<Changes>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    ip_address: Option<String>,
    #[serde(default)]
    user_agent: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

impl TryFrom<StoredAuditEvent> for AuditEvent {
    type Error = AuditError;

    fn try_from(stored: StoredAuditEvent) -> Result<Self, Self::Error> {
        require_id("user", &stored.user_id)?;
        require_id("org", &stored.org_id)?;
        Ok(Self {
            event_id: stored.event_id,
            user_id: stored.user_id,
            org_id: stored.org_id,
            action: stored.action,
            entity_type: stored.entity_type,
            entity_id: stored.entity_id,
            timestamp: stored.timestamp,
            role: stored.role,
            status: stored.status,
            changes: stored.changes.filter(|changes| !changes.is_empty()),
            error: stored.error,
            ip_address: stored.ip_address,
            user_agent: stored.user_agent,
            request_id: stored.request_id,
        })
    }
}

impl AuditEvent {
    /// Create a builder for an audit event.
    pub fn builder(
        user_id: impl Into<String>,
        org_id: impl Into<String>,
        action: AuditAction,
        entity_type: AuditEntityType,
        status: AuditStatus,
    ) -> AuditEventBuilder {
        AuditEventBuilder::new(user_id, org_id, action, entity_type, status)
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn action(&self) -> AuditAction {
        self.action
    }

    pub fn entity_type(&self) -> AuditEntityType {
        self.entity_type
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    pub fn status(&self) -> AuditStatus {
        self.status
    }

    pub fn changes(&self) -> Option<&Changes> {
        self.changes.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    /// Format the human-readable sink message.
    ///
    /// Success: `[AUDIT] {action} on {entity}[:{id}] by user:{user} in org:{org}`
    /// Failure: `[AUDIT] FAILED {action} on {entity}[:{id}] by user:{user} in org:{org}: {error}`
    pub fn to_log_message(&self) -> String {
        let target = match self.entity_id {
            Some(ref id) => format!("{}:{}", self.entity_type, id),
            None => self.entity_type.to_string(),
        };

        match self.status {
            AuditStatus::Success => format!(
                "[AUDIT] {} on {} by user:{} in org:{}",
                self.action, target, self.user_id, self.org_id
            ),
            AuditStatus::Failure => format!(
                "[AUDIT] FAILED {} on {} by user:{} in org:{}: {}",
                self.action,
                target,
                self.user_id,
                self.org_id,
                self.error.as_deref().unwrap_or("unknown error")
            ),
        }
    }
}

/// Builder for creating audit events.
#[derive(Debug)]
pub struct AuditEventBuilder {
    user_id: String,
    org_id: String,
    action: AuditAction,
    entity_type: AuditEntityType,
    status: AuditStatus,
    entity_id: Option<String>,
    role: Option<String>,
    changes: Option<Changes>,
    error: Option<String>,
    ip_address: Option<String>,
    user_agent: Option<String>,
    request_id: Option<String>,
}

impl AuditEventBuilder {
    /// Create a new builder with required fields.
    pub fn new(
        user_id: impl Into<String>,
        org_id: impl Into<String>,
        action: AuditAction,
        entity_type: AuditEntityType,
        status: AuditStatus,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            org_id: org_id.into(),
            action,
            entity_type,
            status,
            entity_id: None,
            role: None,
            changes: None,
            error: None,
            ip_address: None,
            user_agent: None,
            request_id: None,
        }
    }

    /// Set the affected entity id.
    pub fn entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Set the actor's role snapshot.
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Attach field-level changes. Empty maps are dropped.
    pub fn changes(mut self, changes: Changes) -> Self {
        if !changes.is_empty() {
            self.changes = Some(changes);
        }
        self
    }

    /// Set the error message.
    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    /// Set the client IP.
    pub fn ip_address(mut self, ip: impl Into<String>) -> Self {
        self.ip_address = Some(ip.into());
        self
    }

    /// Set the client user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the request correlation id.
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Build the audit event, stamping it with the current time.
    ///
    /// Fails when the user or org id is empty.
    pub fn build(self) -> Result<AuditEvent, AuditError> {
        require_id("user", &self.user_id)?;
        require_id("org", &self.org_id)?;
        Ok(AuditEvent {
            event_id: Uuid::new_v4(),
            user_id: self.user_id,
            org_id: self.org_id,
            action: self.action,
            entity_type: self.entity_type,
            entity_id: self.entity_id,
            timestamp: Utc::now(),
            role: self.role,
            status: self.status,
            changes: self.changes,
            error: self.error,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            request_id: self.request_id,
        })
    }
}
