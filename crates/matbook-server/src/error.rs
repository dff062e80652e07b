//! Error types for the server crate.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use matbook_audit::AuditError;
use matbook_cache::ReportError;
use thiserror::Error;

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Identity headers were missing or empty.
    #[error("authentication required: {0}")]
    Unauthenticated(String),

    /// The body could not be read.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The body was read but did not describe a valid request.
    #[error("invalid body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    /// Audit sink failure.
    #[error("audit error: {0}")]
    Audit(AuditError),

    /// Report backend missing or failing.
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::InvalidContext(reason) => ApiError::Unauthenticated(reason),
            other => ApiError::Audit(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Audit(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Report(ReportError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Report(ReportError::Failed(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (status, self.to_string()).into_response()
    }
}
