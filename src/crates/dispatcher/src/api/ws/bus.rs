//! Event broadcast bus
//!
//! One broadcast channel fans every event out to all connected WebSocket
//! clients. Sends never block: a client that falls more than the buffer
//! behind misses events and is told so by the connection handler.

use tokio::sync::broadcast;

use crate::api::ws::events::UiEvent;

/// Default broadcast buffer size
pub const DEFAULT_CAPACITY: usize = 256;

/// Shared event bus for WebSocket fan-out
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<UiEvent>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Broadcast an event, ignoring whether anyone is listening
    pub fn broadcast_lossy(&self, event: UiEvent) {
        if let Ok(count) = self.tx.send(event) {
            tracing::debug!("Broadcast event to {} client(s)", count);
        }
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    /// Current number of subscribed clients
    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
