//! Health check endpoint handlers

use axum::{extract::State, http::StatusCode, Json};

use crate::api::{models::HealthResponse, response, routes::AppState};

/// Handler for GET /health
///
/// Returns basic health status without touching the workflows tree.
pub async fn health() -> impl axum::response::IntoResponse {
    let health = HealthResponse::new("ok", "loaded");
    response::ok(health)
}

/// Handler for GET /api/v1/system/health
///
/// Returns detailed health including a bundle check of the current mapping.
/// A broken bundle tree degrades the status but keeps serving: listings and
/// selections for intact rows still work.
pub async fn health_detailed(
    State(app_state): State<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let report = app_state.registry.validate();
    let uptime = app_state.started_at.elapsed().as_secs();

    let health = if report.is_ok() {
        HealthResponse::new("ok", format!("{} bundle(s) ok", report.bundles_ok))
    } else {
        HealthResponse::new("degraded", format!("{} bundle issue(s)", report.issues.len()))
    };
    (StatusCode::OK, Json(health.with_details(report.tasks, uptime)))
}
