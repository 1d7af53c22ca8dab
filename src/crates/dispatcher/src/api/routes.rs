//! API route definitions
//!
//! Defines all API routes and their associated handler functions.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;

use crate::api::ws::{EventBus, ProgressBoard};
use crate::api::{handlers, middleware, ws};
use quality::QualityRegistry;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<QualityRegistry>,
    pub events: EventBus,
    pub progress: Arc<ProgressBoard>,
    pub server_name: String,
    pub started_at: Instant,
}

impl AppState {
    /// Assemble state around a loaded registry
    pub fn new(registry: Arc<QualityRegistry>, events: EventBus, server_name: impl Into<String>) -> Self {
        Self {
            registry,
            events,
            progress: Arc::new(ProgressBoard::new()),
            server_name: server_name.into(),
            started_at: Instant::now(),
        }
    }
}

/// Build the complete API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check endpoints
        .route("/health", get(handlers::health))
        .route("/api/v1/system/health", get(handlers::health_detailed))
        .route("/api/v1/system/info", get(handlers::system_info))
        // Quality dispatch endpoints
        .route("/api/v1/quality/tasks", get(handlers::list_tasks))
        .route("/api/v1/quality/tiers/:task_type", get(handlers::get_tiers))
        .route("/api/v1/quality/select", post(handlers::select_quality))
        .route("/api/v1/quality/validate", post(handlers::validate_mapping))
        .route("/api/v1/quality/reload", post(handlers::reload_mapping))
        // Progress endpoints
        .route("/api/v1/progress", get(handlers::list_progress))
        .route("/api/v1/progress/report", post(handlers::report_progress))
        .route(
            "/api/v1/progress/:task_id",
            get(handlers::get_progress).delete(handlers::clear_progress),
        )
        // Real-time updates
        .route("/ws", get(ws::ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .with_state(state)
}
