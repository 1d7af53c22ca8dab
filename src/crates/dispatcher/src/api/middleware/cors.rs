//! CORS middleware configuration
//!
//! The dispatcher serves browser UIs running on other local ports, so CORS
//! allows any origin in development deployments.

use tower_http::cors::CorsLayer;

/// Create CORS layer for development (allows localhost)
pub fn cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}
