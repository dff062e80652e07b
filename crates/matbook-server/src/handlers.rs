//! Request handlers.
//!
//! Authentication lives upstream; by the time a request reaches these
//! handlers the gateway has set `x-user-id`, `x-org-id` and, when known,
//! `x-role`.

use axum::Json;
use axum::body::to_bytes;
use axum::extract::{ConnectInfo, Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode};
use matbook_audit::{
    AuditAction, AuditContext, AuditEntityType, AuditStatus, FieldMap, RecordOptions,
};
use matbook_billing::{PlanDetails, SubscriptionSnapshot};
use matbook_cache::{ReportKey, ReportKind, ReportRange};
use matbook_core::PlanDefinition;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::net::SocketAddr;

use crate::error::ApiError;
use crate::state::AppState;

/// Largest accepted audit ingestion body.
const MAX_BODY_BYTES: usize = 256 * 1024;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ORG_ID_HEADER: &str = "x-org-id";
pub const ROLE_HEADER: &str = "x-role";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true, "service": "matbook-server" }))
}

/// `GET /v1/billing/plans`
pub async fn list_plans(State(state): State<AppState>) -> Json<Vec<PlanDefinition>> {
    Json(state.billing().catalog().plans().to_vec())
}

/// `POST /v1/billing/plan`: body is a snapshot or `null`.
///
/// Any JSON that is not a readable snapshot resolves to the free plan.
pub async fn resolve_plan(
    State(state): State<AppState>,
    Json(value): Json<Value>,
) -> Json<PlanDetails> {
    let snapshot = SubscriptionSnapshot::from_json(value);
    Json(state.billing().determine_subscription_plan(snapshot.as_ref()))
}

/// Body of `POST /v1/audit/events`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordEventRequest {
    pub action: AuditAction,
    /// Defaults to the action's entity prefix.
    #[serde(default)]
    pub entity_type: Option<AuditEntityType>,
    pub status: AuditStatus,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub before: Option<FieldMap>,
    #[serde(default)]
    pub after: Option<FieldMap>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct RecordEventResponse {
    pub recorded: bool,
    pub changed: Vec<String>,
}

/// `POST /v1/audit/events`
pub async fn record_event(
    State(state): State<AppState>,
    request: Request,
) -> Result<(StatusCode, Json<RecordEventResponse>), ApiError> {
    let (parts, body) = request.into_parts();
    let context = context_from_headers(&parts.headers)?;

    let bytes = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
    let body: RecordEventRequest = serde_json::from_slice(&bytes)?;

    let changes = match (&body.before, &body.after) {
        (Some(before), Some(after)) => {
            let fields: Option<Vec<&str>> = body
                .fields
                .as_ref()
                .map(|fields| fields.iter().map(String::as_str).collect());
            state
                .audit()
                .compute_changes(before, after, fields.as_deref())
        }
        _ => None,
    };
    let changed: Vec<String> = changes
        .as_ref()
        .map(|changes| changes.keys().cloned().collect())
        .unwrap_or_default();

    let mut options = RecordOptions::new(body.status).changes(changes);
    if let Some(error) = body.error {
        options = options.error(error);
    }
    if let Some(id) = body.entity_id {
        options = options.entity_id(id);
    }
    if let Some(ip) = client_ip(&parts.headers, parts.extensions.get::<ConnectInfo<SocketAddr>>())
    {
        options = options.ip_address(ip);
    }
    if let Some(user_agent) = header_str(&parts.headers, "user-agent") {
        options = options.user_agent(user_agent);
    }
    if let Some(id) = header_str(&parts.headers, REQUEST_ID_HEADER) {
        options = options.request_id(id);
    }

    let entity_type = body.entity_type.unwrap_or_else(|| body.action.entity_type());
    state
        .audit()
        .record(&context, body.action, entity_type, options)
        .await?;

    // A successful write can move any of the organization's figures.
    if body.status == AuditStatus::Success {
        state.reports().invalidate_org(context.org_id());
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(RecordEventResponse {
            recorded: true,
            changed,
        }),
    ))
}

/// `GET /v1/reports/{report}?from=YYYY-MM-DD&to=YYYY-MM-DD`
///
/// Served from the report cache for the caller's organization.
pub async fn get_report(
    State(state): State<AppState>,
    Path(report): Path<ReportKind>,
    Query(range): Query<ReportRange>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    let context = context_from_headers(&headers)?;
    if range.from > range.to {
        return Err(ApiError::InvalidRequest(format!(
            "range starts {} after it ends {}",
            range.from, range.to
        )));
    }

    let key = ReportKey::new(context.org_id(), report, range);
    let data = state
        .reports()
        .get_or_fetch(key, state.report_source())
        .await?;
    Ok(Json(data))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn context_from_headers(headers: &HeaderMap) -> Result<AuditContext, ApiError> {
    let user_id = header_str(headers, USER_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {}", USER_ID_HEADER)))?;
    let org_id = header_str(headers, ORG_ID_HEADER)
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {}", ORG_ID_HEADER)))?;

    let context = AuditContext::new(user_id, org_id)?;
    Ok(match header_str(headers, ROLE_HEADER) {
        Some(role) => context.with_role(role),
        None => context,
    })
}

/// First `x-forwarded-for` hop, else the peer address.
fn client_ip(headers: &HeaderMap, peer: Option<&ConnectInfo<SocketAddr>>) -> Option<String> {
    header_str(headers, "x-forwarded-for")
        .and_then(|value| value.split(',').next())
        .map(|hop| hop.trim().to_string())
        .filter(|hop| !hop.is_empty())
        .or_else(|| peer.map(|ConnectInfo(addr)| addr.ip().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_context_requires_both_ids() {
        let mut headers = HeaderMap::new();
        headers.insert(USER_ID_HEADER, HeaderValue::from_static("usr_1"));
        assert!(matches!(
            context_from_headers(&headers),
            Err(ApiError::Unauthenticated(_))
        ));

        headers.insert(ORG_ID_HEADER, HeaderValue::from_static("org_1"));
        headers.insert(ROLE_HEADER, HeaderValue::from_static("coach"));
        let context = context_from_headers(&headers).unwrap();
        assert_eq!(context.org_id(), "org_1");
        assert_eq!(context.role(), Some("coach"));
    }

    #[test]
    fn test_client_ip_prefers_forwarded_header() {
        let peer = ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 5000)));
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(&peer)).as_deref(), Some("192.0.2.1"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, Some(&peer)).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&HeaderMap::new(), None), None);
    }
}
