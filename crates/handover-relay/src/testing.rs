// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test fixtures for the relay crate's unit tests.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use handover_core::{
    DeliveryConfirmation, DeliveryError, DeliveryProvider, DeliveryReceipt, OutboundKind,
};
use handover_storage::{Database, queries};

use crate::broadcast::Broadcaster;
use crate::coordinator::ChatCoordinator;
use crate::monitor::DeliveryMonitor;
use crate::retry::RetryPolicy;

/// One recorded `deliver` call.
#[derive(Debug, Clone)]
pub(crate) struct RecordedDelivery {
    pub phone: String,
    pub text: String,
    pub kind: OutboundKind,
}

/// A scripted delivery provider. Outcomes are popped from FIFO queues;
/// when a queue is empty the default outcome is success/confirmed.
#[derive(Default)]
pub(crate) struct StubProvider {
    deliveries: Mutex<VecDeque<Result<DeliveryReceipt, DeliveryError>>>,
    confirmations: Mutex<VecDeque<Result<DeliveryConfirmation, DeliveryError>>>,
    calls: Mutex<Vec<RecordedDelivery>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn queue_delivery(&self, outcome: Result<DeliveryReceipt, DeliveryError>) {
        self.deliveries.lock().await.push_back(outcome);
    }

    pub async fn queue_confirmation(
        &self,
        outcome: Result<DeliveryConfirmation, DeliveryError>,
    ) {
        self.confirmations.lock().await.push_back(outcome);
    }

    pub async fn recorded(&self) -> Vec<RecordedDelivery> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl DeliveryProvider for StubProvider {
    async fn deliver(
        &self,
        phone: &str,
        text: &str,
        kind: OutboundKind,
    ) -> Result<DeliveryReceipt, DeliveryError> {
        self.calls.lock().await.push(RecordedDelivery {
            phone: phone.to_string(),
            text: text.to_string(),
            kind,
        });
        self.deliveries.lock().await.pop_front().unwrap_or_else(|| {
            Ok(DeliveryReceipt {
                external_id: format!("wamid.stub-{}", uuid::Uuid::new_v4()),
            })
        })
    }

    async fn check_delivery(
        &self,
        _external_id: &str,
    ) -> Result<DeliveryConfirmation, DeliveryError> {
        self.confirmations
            .lock()
            .await
            .pop_front()
            .unwrap_or(Ok(DeliveryConfirmation::Confirmed))
    }
}

/// A fully wired relay core over a tempfile database, with one capture
/// connection registered on the broadcaster.
pub(crate) struct Rig {
    pub db: Database,
    pub provider: Arc<StubProvider>,
    pub monitor: Arc<DeliveryMonitor>,
    pub coordinator: ChatCoordinator,
    pub rx: mpsc::UnboundedReceiver<String>,
    _dir: tempfile::TempDir,
}

pub(crate) async fn rig() -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let db = Database::open(db_path.to_str().unwrap()).await.unwrap();

    let broadcaster = Arc::new(Broadcaster::new());
    let (tx, rx) = mpsc::unbounded_channel();
    broadcaster.register("watcher".to_string(), tx);

    let provider = Arc::new(StubProvider::new());
    let monitor = Arc::new(DeliveryMonitor::new(
        db.clone(),
        provider.clone(),
        broadcaster.clone(),
        Duration::from_secs(30),
    ));

    let coordinator = ChatCoordinator::new(
        db.clone(),
        provider.clone(),
        broadcaster.clone(),
        monitor.clone(),
        RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        },
        24,
    );

    Rig {
        db,
        provider,
        monitor,
        coordinator,
        rx,
        _dir: dir,
    }
}

/// Create a chat directly in the store and return its id.
pub(crate) async fn seed_chat(db: &Database, phone: &str, last_activity: &str) -> i64 {
    let chat = queries::chats::find_or_create_by_phone(db, phone, Some("Sam"), last_activity)
        .await
        .unwrap();
    // find_or_create stamps "now"; pin the requested activity timestamp.
    queries::chats::touch_activity(db, chat.id, last_activity)
        .await
        .unwrap();
    chat.id
}

/// Register an online agent directly in the store.
pub(crate) async fn seed_agent(db: &Database, agent_id: &str, name: &str) {
    queries::agents::upsert_online(db, agent_id, name, "conn-test", "2026-01-01T00:00:00+00:00")
        .await
        .unwrap();
}

/// Drain all events currently buffered on the capture connection.
pub(crate) fn drain(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<serde_json::Value> {
    let mut events = Vec::new();
    while let Ok(raw) = rx.try_recv() {
        events.push(serde_json::from_str(&raw).unwrap());
    }
    events
}
