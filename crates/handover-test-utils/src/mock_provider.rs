// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock delivery provider for deterministic testing.
//!
//! `MockProvider` implements `DeliveryProvider` with pre-configured
//! outcomes, enabling fast, CI-runnable tests without a real messaging
//! provider.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use handover_core::{
    DeliveryConfirmation, DeliveryError, DeliveryProvider, DeliveryReceipt, OutboundKind,
};

/// One recorded `deliver` call.
#[derive(Debug, Clone)]
pub struct RecordedDelivery {
    pub phone: String,
    pub text: String,
    pub kind: OutboundKind,
}

/// A mock delivery provider that returns pre-configured outcomes.
///
/// Outcomes are popped from FIFO queues. When the delivery queue is
/// empty, a success receipt with a generated external id is returned;
/// when the confirmation queue is empty, delivery is confirmed.
pub struct MockProvider {
    deliveries: Arc<Mutex<VecDeque<Result<DeliveryReceipt, DeliveryError>>>>,
    confirmations: Arc<Mutex<VecDeque<Result<DeliveryConfirmation, DeliveryError>>>>,
    calls: Arc<Mutex<Vec<RecordedDelivery>>>,
}

impl MockProvider {
    /// Create a new mock provider with empty outcome queues.
    pub fn new() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(VecDeque::new())),
            confirmations: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue a delivery outcome.
    pub async fn add_delivery(&self, outcome: Result<DeliveryReceipt, DeliveryError>) {
        self.deliveries.lock().await.push_back(outcome);
    }

    /// Queue a confirmation outcome.
    pub async fn add_confirmation(&self, outcome: Result<DeliveryConfirmation, DeliveryError>) {
        self.confirmations.lock().await.push_back(outcome);
    }

    /// All `deliver` calls recorded so far, in order.
    pub async fn recorded_deliveries(&self) -> Vec<RecordedDelivery> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeliveryProvider for MockProvider {
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
                external_id: format!("wamid.mock-{}", uuid::Uuid::new_v4()),
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
