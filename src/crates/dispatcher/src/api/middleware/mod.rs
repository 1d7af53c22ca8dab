//! API middleware layer
//!
//! Provides middleware for request processing including CORS and validation.

pub mod cors;
pub mod validation;

pub use cors::cors_layer;
pub use validation::{validate_not_empty, validate_progress};
