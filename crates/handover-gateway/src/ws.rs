// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard WebSocket handler.
//!
//! Client -> Server (JSON):
//! ```json
//! {"event": "authenticate", "data": {"agent_id": "a1", "name": "Alice"}}
//! {"event": "take_over_chat", "data": {"chat_id": 42}}
//! {"event": "send_manual_message", "data": {"chat_id": 42, "message": "hello"}}
//! {"event": "release_chat", "data": {"chat_id": 42}}
//! ```
//!
//! Every request produces exactly one `<event>_response` envelope with a
//! `{status: "success"|"error"}` payload on the same socket. Broadcasts
//! (`agent_list_update`, `new_manual_message`, ...) arrive interleaved on
//! the same channel.
//!
//! A connection that does not authenticate within the configured window
//! is closed; so is a connection whose authenticate failed durably.

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{info, warn};

use handover_core::AuthError;

use crate::server::GatewayState;

/// Envelope for client -> server requests.
#[derive(Debug, Deserialize)]
struct WsRequest {
    event: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AuthenticatePayload {
    agent_id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct TakeoverPayload {
    chat_id: i64,
}

#[derive(Debug, Deserialize)]
struct SendManualMessagePayload {
    chat_id: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseChatPayload {
    chat_id: i64,
}

/// WebSocket upgrade handler.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<GatewayState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Handle an individual dashboard connection.
///
/// The connection is registered on the broadcaster immediately so it
/// receives fan-out while the authentication window is open; the window
/// expiring closes the socket.
async fn handle_socket(socket: WebSocket, state: GatewayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let connection_id = uuid::Uuid::new_v4().to_string();

    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.broadcaster.register(connection_id.clone(), tx.clone());

    // Forward responses and broadcasts to the socket.
    let sender_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    let deadline = tokio::time::sleep(state.auth_timeout);
    tokio::pin!(deadline);
    let mut authenticated = false;

    loop {
        tokio::select! {
            () = &mut deadline, if !authenticated => {
                info!(connection_id = %connection_id, "authentication timeout, closing connection");
                break;
            }
            incoming = ws_receiver.next() => {
                let Some(Ok(msg)) = incoming else { break };
                match msg {
                    Message::Text(text) => {
                        let text_str: &str = &text;
                        let request: WsRequest = match serde_json::from_str(text_str) {
                            Ok(request) => request,
                            Err(e) => {
                                warn!(connection_id = %connection_id, error = %e, "invalid WebSocket message");
                                continue;
                            }
                        };
                        if dispatch(&state, &connection_id, &tx, request, &mut authenticated).await {
                            break;
                        }
                    }
                    Message::Close(_) => break,
                    _ => {} // Binary and ping frames are handled by the transport.
                }
            }
        }
    }

    // Cleanup. `release` is idempotent, so an unauthenticated or
    // already-released connection is a no-op here.
    state.broadcaster.unregister(&connection_id);
    state.registry.release(&connection_id).await;
    sender_task.abort();
}

/// Handle one request and send its response. Returns `true` when the
/// connection must be closed.
async fn dispatch(
    state: &GatewayState,
    connection_id: &str,
    tx: &mpsc::UnboundedSender<String>,
    request: WsRequest,
    authenticated: &mut bool,
) -> bool {
    let response_event = format!("{}_response", request.event);

    match request.event.as_str() {
        "authenticate" => {
            let Some(payload) = parse_payload::<AuthenticatePayload>(tx, &response_event, request.data)
            else {
                return false;
            };
            match state
                .registry
                .authenticate(connection_id, &payload.agent_id, &payload.name)
                .await
            {
                Ok(summary) => {
                    *authenticated = true;
                    respond(
                        tx,
                        &response_event,
                        json!({"status": "success", "agent_id": summary.id}),
                    );
                    false
                }
                Err(err @ AuthError::InvalidCredentials) => {
                    respond_error(tx, &response_event, &err.to_string());
                    false
                }
                Err(err @ AuthError::Store(_)) => {
                    // No partial state: the mapping was not recorded, and
                    // the connection goes down with the failure.
                    warn!(connection_id = %connection_id, error = %err, "authenticate store failure");
                    respond_error(tx, &response_event, &err.to_string());
                    true
                }
            }
        }
        "take_over_chat" => {
            let Some(agent_id) = require_agent(state, connection_id, tx, &response_event) else {
                return false;
            };
            let Some(payload) = parse_payload::<TakeoverPayload>(tx, &response_event, request.data)
            else {
                return false;
            };
            match state.coordinator.takeover(payload.chat_id, &agent_id).await {
                Ok(chat) => respond(
                    tx,
                    &response_event,
                    json!({"status": "success", "chat_id": chat.id}),
                ),
                Err(err) => respond_error(tx, &response_event, &err.to_string()),
            }
            false
        }
        "send_manual_message" => {
            let Some(agent_id) = require_agent(state, connection_id, tx, &response_event) else {
                return false;
            };
            let Some(payload) =
                parse_payload::<SendManualMessagePayload>(tx, &response_event, request.data)
            else {
                return false;
            };
            match state
                .coordinator
                .send_agent_message(payload.chat_id, &agent_id, &payload.message)
                .await
            {
                Ok(message) => respond(
                    tx,
                    &response_event,
                    json!({
                        "status": "success",
                        "message_id": message.id,
                        "delivery_status": message.delivery_status.to_string(),
                    }),
                ),
                Err(err) => respond_error(tx, &response_event, &err.to_string()),
            }
            false
        }
        "release_chat" => {
            let Some(_agent_id) = require_agent(state, connection_id, tx, &response_event) else {
                return false;
            };
            let Some(payload) =
                parse_payload::<ReleaseChatPayload>(tx, &response_event, request.data)
            else {
                return false;
            };
            match state.coordinator.release_chat(payload.chat_id).await {
                Ok(chat) => respond(
                    tx,
                    &response_event,
                    json!({"status": "success", "chat_id": chat.id}),
                ),
                Err(err) => respond_error(tx, &response_event, &err.to_string()),
            }
            false
        }
        other => {
            respond_error(tx, &response_event, &format!("unknown event `{other}`"));
            false
        }
    }
}

/// The agent bound to this connection, or an error response when the
/// connection never authenticated.
fn require_agent(
    state: &GatewayState,
    connection_id: &str,
    tx: &mpsc::UnboundedSender<String>,
    response_event: &str,
) -> Option<String> {
    let agent = state.registry.agent_for_connection(connection_id);
    if agent.is_none() {
        respond_error(tx, response_event, "not authenticated");
    }
    agent
}

fn parse_payload<T: serde::de::DeserializeOwned>(
    tx: &mpsc::UnboundedSender<String>,
    response_event: &str,
    data: serde_json::Value,
) -> Option<T> {
    match serde_json::from_value(data) {
        Ok(payload) => Some(payload),
        Err(e) => {
            respond_error(tx, response_event, &format!("invalid payload: {e}"));
            None
        }
    }
}

fn respond(tx: &mpsc::UnboundedSender<String>, event: &str, data: serde_json::Value) {
    let envelope = json!({"event": event, "data": data}).to_string();
    // A failed send means the writer task is gone; the connection is
    // already on its way down.
    let _ = tx.send(envelope);
}

fn respond_error(tx: &mpsc::UnboundedSender<String>, event: &str, message: &str) {
    respond(tx, event, json!({"status": "error", "message": message}));
}
