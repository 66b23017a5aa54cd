// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the gateway REST API.
//!
//! All endpoints answer with a `{status: "success"|"error", ...}`
//! envelope. These are thin: the relay core and storage queries do the
//! work.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use handover_storage::{Chat, Message, queries};

use crate::server::GatewayState;

/// Error envelope shared by all endpoints.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

fn error_response(code: StatusCode, message: impl Into<String>) -> Response {
    (
        code,
        Json(ErrorResponse {
            status: "error",
            message: message.into(),
        }),
    )
        .into_response()
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: String,
}

/// GET /health
///
/// Unauthenticated liveness probe.
pub async fn get_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Response body for GET /api/chats.
#[derive(Debug, Serialize)]
pub struct ChatListResponse {
    pub status: &'static str,
    pub chats: Vec<Chat>,
}

/// GET /api/chats
pub async fn get_chats(State(state): State<GatewayState>) -> Response {
    match queries::chats::list_chats(&state.db).await {
        Ok(chats) => (
            StatusCode::OK,
            Json(ChatListResponse {
                status: "success",
                chats,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "failed to list chats");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to list chats")
        }
    }
}

/// Query parameters for GET /api/messages.
#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub chat_id: i64,
    #[serde(default)]
    pub limit: Option<i64>,
}

/// Response body for GET /api/messages.
#[derive(Debug, Serialize)]
pub struct MessageListResponse {
    pub status: &'static str,
    pub messages: Vec<Message>,
}

/// GET /api/messages?chat_id=
pub async fn get_messages(
    State(state): State<GatewayState>,
    Query(query): Query<MessagesQuery>,
) -> Response {
    match queries::messages::get_messages_for_chat(&state.db, query.chat_id, query.limit).await {
        Ok(messages) => (
            StatusCode::OK,
            Json(MessageListResponse {
                status: "success",
                messages,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(chat_id = query.chat_id, error = %e, "failed to list messages");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to list messages")
        }
    }
}

/// Response body for POST /notify.
#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub status: &'static str,
}

/// POST /notify
///
/// Pass-through: the payload is broadcast verbatim under its `type`
/// field. No validation beyond requiring `type`; this is intentionally
/// permissive.
pub async fn post_notify(
    State(state): State<GatewayState>,
    Json(payload): Json<serde_json::Value>,
) -> Response {
    let Some(event) = payload.get("type").and_then(|t| t.as_str()).map(str::to_string) else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "notification requires a `type` field",
        );
    };

    state.broadcaster.broadcast_raw(&event, &payload);
    (StatusCode::OK, Json(NotifyResponse { status: "success" })).into_response()
}

/// Response body for GET /human_available.
#[derive(Debug, Serialize)]
pub struct HumanAvailableResponse {
    pub status: &'static str,
    pub available: bool,
}

/// GET /human_available
///
/// Whether any human agent is online, for the automated responder to
/// decide between offering a handoff and answering itself.
pub async fn get_human_available(State(state): State<GatewayState>) -> Response {
    match state.registry.human_available().await {
        Ok(available) => (
            StatusCode::OK,
            Json(HumanAvailableResponse {
                status: "success",
                available,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "failed to read roster");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "failed to read roster")
        }
    }
}

/// Request body for POST /webhook/incoming.
#[derive(Debug, Deserialize)]
pub struct IncomingMessageRequest {
    pub phone: String,
    #[serde(default)]
    pub profile_name: Option<String>,
    pub message: String,
}

/// Response body for POST /webhook/incoming.
#[derive(Debug, Serialize)]
pub struct IncomingMessageResponse {
    pub status: &'static str,
    pub chat_id: i64,
    pub message_id: String,
}

/// POST /webhook/incoming
///
/// Provider-shaped inbound message ingestion: records the message
/// (creating the conversation lazily) and broadcasts it to dashboards.
pub async fn post_webhook_incoming(
    State(state): State<GatewayState>,
    Json(body): Json<IncomingMessageRequest>,
) -> Response {
    if body.phone.trim().is_empty() {
        return error_response(StatusCode::UNPROCESSABLE_ENTITY, "phone must not be empty");
    }

    match state
        .coordinator
        .record_incoming_message(&body.phone, body.profile_name.as_deref(), &body.message)
        .await
    {
        Ok(message) => (
            StatusCode::OK,
            Json(IncomingMessageResponse {
                status: "success",
                chat_id: message.chat_id,
                message_id: message.id,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(phone = %body.phone, error = %e, "failed to record incoming message");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "failed to record incoming message",
            )
        }
    }
}
