//! WebSocket connection handler
//!
//! Upgrades GET /ws and streams bus events to the client as JSON text
//! frames. A client may scope the stream to one task with `?task_id=`;
//! events without a task ID (connection, config, selection) always pass
//! the filter. Inbound `{"type":"ping"}` frames get a `{"type":"pong"}`
//! back; any other text frame earns an error event.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;

use crate::api::routes::AppState;
use crate::api::ws::events::UiEvent;

/// Connection options taken from the query string
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsQuery {
    /// Restrict task events to this task ID
    pub task_id: Option<String>,
}

/// Handler for GET /ws
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| client_connection(socket, state, query.task_id))
}

/// Per-client event loop
async fn client_connection(socket: WebSocket, state: AppState, task_filter: Option<String>) {
    let client_id = uuid::Uuid::new_v4().to_string();
    let mut rx = state.events.subscribe();

    tracing::info!(
        "WebSocket client {} connected ({} total)",
        client_id,
        state.events.client_count()
    );

    let (mut sender, mut receiver) = socket.split();

    let greeting = UiEvent::connection_established(client_id.clone());
    if !send_event(&mut sender, &greeting).await {
        return;
    }

    loop {
        tokio::select! {
            event = rx.recv() => {
                match event {
                    Ok(event) => {
                        if !passes_filter(&event, task_filter.as_deref()) {
                            continue;
                        }
                        if !send_event(&mut sender, &event).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(
                            "WebSocket client {} lagged, {} event(s) dropped",
                            client_id,
                            missed
                        );
                        let notice = UiEvent::Error {
                            message: format!("{missed} event(s) dropped"),
                            code: Some("LAGGED".to_string()),
                        };
                        if !send_event(&mut sender, &notice).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            inbound = receiver.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        if is_ping(&text) {
                            let pong = r#"{"type":"pong"}"#.to_string();
                            if sender.send(Message::Text(pong)).await.is_err() {
                                break;
                            }
                        } else {
                            let notice = UiEvent::Error {
                                message: "Unrecognized message".to_string(),
                                code: Some("UNRECOGNIZED".to_string()),
                            };
                            if !send_event(&mut sender, &notice).await {
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(payload))) => {
                        if sender.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::debug!("WebSocket client {} error: {}", client_id, e);
                        break;
                    }
                }
            }
        }
    }

    tracing::info!("WebSocket client {} disconnected", client_id);
}

/// `{"type":"ping"}` frames and bare `ping` text both count
fn is_ping(text: &str) -> bool {
    if text.trim() == "ping" {
        return true;
    }
    serde_json::from_str::<serde_json::Value>(text)
        .map(|value| value["type"] == "ping")
        .unwrap_or(false)
}

/// Task-scoped clients only see their own task events
fn passes_filter(event: &UiEvent, task_filter: Option<&str>) -> bool {
    match (task_filter, event.task_id()) {
        (Some(filter), Some(task_id)) => filter == task_id,
        _ => true,
    }
}

async fn send_event<S>(sender: &mut S, event: &UiEvent) -> bool
where
    S: futures::Sink<Message> + Unpin,
{
    match event.to_json() {
        Ok(text) => sender.send(Message::Text(text)).await.is_ok(),
        Err(e) => {
            tracing::warn!("Failed to serialize event: {}", e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_passes_untagged_events() {
        let event = UiEvent::connection_established("c1");
        assert!(passes_filter(&event, Some("task1")));
        assert!(passes_filter(&event, None));
    }

    #[test]
    fn test_filter_matches_task_id() {
        let event = UiEvent::task_completed("task1", "done");
        assert!(passes_filter(&event, Some("task1")));
        assert!(!passes_filter(&event, Some("task2")));
        assert!(passes_filter(&event, None));
    }

    #[test]
    fn test_ping_detection() {
        assert!(is_ping("ping"));
        assert!(is_ping("  ping\n"));
        assert!(is_ping(r#"{"type":"ping"}"#));
        assert!(!is_ping(r#"{"type":"subscribe"}"#));
        assert!(!is_ping("hello"));
        assert!(!is_ping("{not json"));
    }
}
