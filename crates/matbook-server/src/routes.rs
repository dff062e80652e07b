//! Route definitions.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(handlers::healthz))
        .route("/v1/billing/plans", get(handlers::list_plans))
        .route("/v1/billing/plan", post(handlers::resolve_plan))
        .route("/v1/audit/events", post(handlers::record_event))
        .route("/v1/reports/{report}", get(handlers::get_report))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
