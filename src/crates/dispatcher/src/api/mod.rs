//! REST API layer for the dispatcher
//!
//! Provides HTTP/REST endpoints for quality dispatch operations including:
//! - Task catalogue and tier listings
//! - Selection resolution
//! - Mapping validation and reload
//! - Progress reporting and queries
//! - WebSocket real-time updates

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod ws;

pub use error::{ApiError, ApiErrorResponse, ApiResult};
pub use response::SuccessResponse;
pub use routes::{create_router, AppState};
