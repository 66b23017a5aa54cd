// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Isolated test harness wiring the full relay core over a temp SQLite
//! database and a mock delivery provider.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use handover_core::{DeliveryConfirmation, DeliveryError, DeliveryReceipt, HandoverError};
use handover_relay::{Broadcaster, ChatCoordinator, DeliveryMonitor, PresenceRegistry, RetryPolicy};
use handover_storage::Database;

use crate::mock_provider::MockProvider;

/// A fully wired relay core for tests. Each harness owns its own temp
/// database; harnesses are independent and order-insensitive.
pub struct TestHarness {
    pub db: Database,
    pub broadcaster: Arc<Broadcaster>,
    pub provider: Arc<MockProvider>,
    pub monitor: Arc<DeliveryMonitor>,
    pub coordinator: Arc<ChatCoordinator>,
    pub registry: Arc<PresenceRegistry>,
    _dir: tempfile::TempDir,
}

/// Builder for [`TestHarness`].
#[derive(Default)]
pub struct TestHarnessBuilder {
    deliveries: Vec<Result<DeliveryReceipt, DeliveryError>>,
    confirmations: Vec<Result<DeliveryConfirmation, DeliveryError>>,
    retry_base_delay: Option<Duration>,
    delivery_check_delay: Option<Duration>,
}

impl TestHarnessBuilder {
    /// Pre-load scripted delivery outcomes.
    pub fn with_deliveries(
        mut self,
        outcomes: Vec<Result<DeliveryReceipt, DeliveryError>>,
    ) -> Self {
        self.deliveries = outcomes;
        self
    }

    /// Pre-load scripted confirmation outcomes.
    pub fn with_confirmations(
        mut self,
        outcomes: Vec<Result<DeliveryConfirmation, DeliveryError>>,
    ) -> Self {
        self.confirmations = outcomes;
        self
    }

    /// Override the retry backoff base delay (default 1ms in tests).
    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    /// Override the delivery-check delay (default 30s; tests usually use
    /// `DeliveryMonitor::check_now` instead of waiting).
    pub fn with_delivery_check_delay(mut self, delay: Duration) -> Self {
        self.delivery_check_delay = Some(delay);
        self
    }

    pub async fn build(self) -> Result<TestHarness, HandoverError> {
        let dir = tempfile::tempdir().map_err(|e| HandoverError::Storage {
            source: Box::new(e),
        })?;
        let db_path = dir.path().join("harness.db");
        let db = Database::open(db_path.to_str().unwrap_or("harness.db")).await?;

        let broadcaster = Arc::new(Broadcaster::new());

        let provider = Arc::new(MockProvider::new());
        for outcome in self.deliveries {
            provider.add_delivery(outcome).await;
        }
        for outcome in self.confirmations {
            provider.add_confirmation(outcome).await;
        }

        let monitor = Arc::new(DeliveryMonitor::new(
            db.clone(),
            provider.clone(),
            broadcaster.clone(),
            self.delivery_check_delay
                .unwrap_or(Duration::from_secs(30)),
        ));

        let coordinator = Arc::new(ChatCoordinator::new(
            db.clone(),
            provider.clone(),
            broadcaster.clone(),
            monitor.clone(),
            RetryPolicy {
                max_attempts: 3,
                base_delay: self.retry_base_delay.unwrap_or(Duration::from_millis(1)),
            },
            24,
        ));

        let registry = Arc::new(PresenceRegistry::new(db.clone(), broadcaster.clone()));

        Ok(TestHarness {
            db,
            broadcaster,
            provider,
            monitor,
            coordinator,
            registry,
            _dir: dir,
        })
    }
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::default()
    }

    /// Register a capture connection on the broadcaster and return its
    /// receiving end. Events arrive as raw `{"event", "data"}` JSON.
    pub fn watch(&self, connection_id: &str) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.broadcaster.register(connection_id.to_string(), tx);
        rx
    }
}

/// Drain all buffered events from a capture connection into parsed JSON.
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<serde_json::Value> {
    let mut events = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        events.push(serde_json::from_str(&raw).expect("broadcast events are valid JSON"));
    }
    events
}
