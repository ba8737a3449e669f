//! The `/ws` subscriber channel: each accepted socket is split into a
//! receive half (driving predicate updates) and a send half (driven by the
//! relay's fan-out), ending the subscriber task and notifying the relay
//! when either half errors or the client closes (§4.5).

use crate::transport::AppState;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;

pub async fn handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (id, mut outbound) = state.relay.register();

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        if !handle_inbound(&state, id, &text) {
                            tracing::debug!(subscriber = id, "closing subscriber on malformed predicate update");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(err)) => {
                        tracing::debug!(subscriber = id, error = %err, "subscriber receive error");
                        break;
                    }
                }
            }
            outgoing = outbound.recv() => {
                match outgoing {
                    Some(text) => {
                        if sender.send(Message::Text((*text).clone())).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    state.relay.remove(id);
}

/// Handles one inbound subscriber message. Returns `false` only when the
/// message named itself a filter update but the update was malformed —
/// that, and only that, tears the subscriber down (§4.3).
fn handle_inbound(state: &AppState, id: crate::relay::SubscriberId, text: &str) -> bool {
    let message: serde_json::Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(err) => {
            tracing::debug!(subscriber = id, error = %err, "ignoring unparseable subscriber message");
            return true;
        }
    };

    match message.get("type").and_then(serde_json::Value::as_str) {
        Some("filter") => {
            let Some(filter) = message.get("filter") else {
                tracing::debug!(subscriber = id, "filter message missing 'filter' field");
                return false;
            };
            match state.relay.update_predicate(id, filter) {
                Ok(()) => true,
                Err(err) => {
                    tracing::debug!(subscriber = id, error = %err, "invalid predicate update");
                    false
                }
            }
        }
        _ => {
            tracing::debug!(subscriber = id, "ignoring message with unknown or missing type");
            true
        }
    }
}
