//! API request handlers
//!
//! Handler functions for all API endpoints organized by resource.

pub mod health;
pub mod progress;
pub mod quality;
pub mod system;

pub use health::{health, health_detailed};
pub use progress::{clear_progress, get_progress, list_progress, report_progress};
pub use quality::{get_tiers, list_tasks, reload_mapping, select_quality, validate_mapping};
pub use system::system_info;
