// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, CORS, and shared state for the REST surface and the
//! dashboard WebSocket endpoint.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{info, warn};

use handover_core::HandoverError;
use handover_relay::{Broadcaster, ChatCoordinator, PresenceRegistry};
use handover_storage::Database;

use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    /// Read access for the thin query endpoints.
    pub db: Database,
    /// Presence registry for authenticate/release and the roster.
    pub registry: Arc<PresenceRegistry>,
    /// Conversation state machine for dashboard actions.
    pub coordinator: Arc<ChatCoordinator>,
    /// Fan-out dispatcher; webhooks pass through it verbatim.
    pub broadcaster: Arc<Broadcaster>,
    /// Window an unauthenticated socket may stay open.
    pub auth_timeout: Duration,
}

/// Gateway server configuration (mirrors ServerConfig from handover-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// Allowed CORS origins; empty means permissive.
    pub cors_origins: Vec<String>,
}

/// Build the gateway router over the given state.
pub fn build_router(state: GatewayState, cors_origins: &[String]) -> Router {
    let cors = cors_layer(cors_origins);

    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/api/chats", get(handlers::get_chats))
        .route("/api/messages", get(handlers::get_messages))
        .route("/notify", post(handlers::post_notify))
        .route("/human_available", get(handlers::get_human_available))
        .route("/webhook/incoming", post(handlers::post_webhook_incoming))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(cors)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(parsed))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the gateway HTTP/WebSocket server.
pub async fn start_server(config: &ServerConfig, state: GatewayState) -> Result<(), HandoverError> {
    let app = build_router(state, &config.cors_origins);

    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| HandoverError::Channel {
                message: format!("failed to bind gateway to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;

    info!("gateway listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| HandoverError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
