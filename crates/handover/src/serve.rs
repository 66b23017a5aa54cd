// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `handover serve` command implementation.
//!
//! Wires the full relay: SQLite storage, the WhatsApp delivery client,
//! the coordination core, and the axum gateway. Storage or provider
//! misconfiguration at startup is fatal; after that, provider and store
//! failures degrade to failed-operation results and the process keeps
//! serving.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use handover_config::HandoverConfig;
use handover_core::{DeliveryProvider, HandoverError};
use handover_gateway::{GatewayState, ServerConfig, start_server};
use handover_relay::{Broadcaster, ChatCoordinator, DeliveryMonitor, PresenceRegistry, RetryPolicy};
use handover_storage::Database;
use handover_whatsapp::WhatsAppClient;

/// Runs the `handover serve` command.
pub async fn run_serve(config: HandoverConfig) -> Result<(), HandoverError> {
    init_tracing(&config.server.log_level);

    info!("starting handover serve");

    // No point serving without durable storage: open failure is fatal.
    let db = Database::open(&config.storage.database_path).await?;

    let broadcaster = Arc::new(Broadcaster::new());

    let provider: Arc<dyn DeliveryProvider> = Arc::new(WhatsAppClient::new(&config.whatsapp)?);

    let monitor = Arc::new(DeliveryMonitor::new(
        db.clone(),
        provider.clone(),
        broadcaster.clone(),
        Duration::from_secs(config.relay.delivery_check_delay_secs),
    ));

    let coordinator = Arc::new(ChatCoordinator::new(
        db.clone(),
        provider,
        broadcaster.clone(),
        monitor,
        RetryPolicy {
            max_attempts: config.relay.max_delivery_attempts,
            base_delay: Duration::from_secs(config.relay.retry_base_delay_secs),
        },
        config.relay.session_window_hours,
    ));

    let registry = Arc::new(PresenceRegistry::new(db.clone(), broadcaster.clone()));

    let state = GatewayState {
        db,
        registry,
        coordinator,
        broadcaster,
        auth_timeout: Duration::from_secs(config.relay.auth_timeout_secs),
    };

    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
        cors_origins: config.server.cors_origins.clone(),
    };

    start_server(&server_config, state).await
}

fn init_tracing(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
