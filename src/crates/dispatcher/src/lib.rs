//! Callsheet dispatcher service
//!
//! The dispatcher is the network surface over the quality registry: a REST
//! API for tier listings, selection resolution, validation and reload, and
//! a WebSocket endpoint streaming progress and configuration events to UIs.
//! Workflow execution itself lives elsewhere; runners report progress back
//! through this service so every connected UI sees one consistent stream.

pub mod api;
pub mod config;

pub use api::routes::{create_router, AppState};
pub use config::DispatcherConfig;

/// Crate version reported by health and info endpoints
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
