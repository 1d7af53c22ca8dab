//! WebSocket API support
//!
//! Real-time event streaming for UIs: selection results, configuration
//! reloads and task progress, fanned out over one broadcast bus.

pub mod bus;
pub mod events;
pub mod handler;
pub mod progress;

pub use bus::EventBus;
pub use events::UiEvent;
pub use handler::{ws_handler, WsQuery};
pub use progress::{ProgressBoard, TaskProgress, TaskStatus};
