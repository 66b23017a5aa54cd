// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deferred delivery-confirmation checks for sent messages.
//!
//! Every message that reaches `sent` gets a one-shot check scheduled
//! after a fixed delay. Pending checks are held only in the running
//! process; losing them on restart is acceptable because delivery status
//! is advisory for the dashboard, not a correctness-critical ledger.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use handover_core::events::{self, MessageStatusUpdate};
use handover_core::{DeliveryConfirmation, DeliveryProvider, DeliveryStatus};
use handover_storage::{Database, queries};

use crate::broadcast::Broadcaster;

/// Standard error recorded when the provider never confirms delivery.
pub const UNCONFIRMED_ERROR: &str = "delivery not confirmed by provider";

/// Schedules and runs deferred delivery-confirmation checks.
pub struct DeliveryMonitor {
    db: Database,
    provider: Arc<dyn DeliveryProvider>,
    broadcaster: Arc<Broadcaster>,
    delay: Duration,
}

impl DeliveryMonitor {
    pub fn new(
        db: Database,
        provider: Arc<dyn DeliveryProvider>,
        broadcaster: Arc<Broadcaster>,
        delay: Duration,
    ) -> Self {
        Self {
            db,
            provider,
            broadcaster,
            delay,
        }
    }

    /// Schedule a one-shot confirmation check for a sent message.
    pub fn schedule(&self, message_id: String, external_id: String) {
        let db = self.db.clone();
        let provider = self.provider.clone();
        let broadcaster = self.broadcaster.clone();
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            run_check(&db, provider.as_ref(), &broadcaster, &message_id, &external_id).await;
        });
    }

    /// Run the confirmation check immediately (test hook; `schedule` is
    /// the production path).
    pub async fn check_now(&self, message_id: &str, external_id: &str) {
        run_check(
            &self.db,
            self.provider.as_ref(),
            &self.broadcaster,
            message_id,
            external_id,
        )
        .await;
    }
}

async fn run_check(
    db: &Database,
    provider: &dyn DeliveryProvider,
    broadcaster: &Broadcaster,
    message_id: &str,
    external_id: &str,
) {
    // Re-read before acting: another path may have finished this message
    // while the check was waiting.
    let message = match queries::messages::get_message(db, message_id).await {
        Ok(Some(message)) => message,
        Ok(None) => {
            warn!(message_id = %message_id, "confirmation check for unknown message");
            return;
        }
        Err(e) => {
            warn!(message_id = %message_id, error = %e, "confirmation check could not read message");
            return;
        }
    };

    if message.delivery_status.is_terminal() {
        debug!(
            message_id = %message_id,
            status = %message.delivery_status,
            "confirmation check skipped, status already terminal"
        );
        return;
    }

    match provider.check_delivery(external_id).await {
        Ok(DeliveryConfirmation::Confirmed) => {
            let advanced = queries::messages::advance_delivery_status(
                db,
                message_id,
                DeliveryStatus::Delivered,
                None,
                None,
            )
            .await;
            match advanced {
                Ok(true) => {
                    broadcaster.broadcast(
                        events::names::MESSAGE_STATUS_UPDATE,
                        &MessageStatusUpdate {
                            message_id: message_id.to_string(),
                            status: DeliveryStatus::Delivered.to_string(),
                            whatsapp_id: Some(external_id.to_string()),
                            error: None,
                        },
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(message_id = %message_id, error = %e, "failed to record delivery confirmation")
                }
            }
        }
        Ok(DeliveryConfirmation::Unconfirmed) => {
            let advanced = queries::messages::advance_delivery_status(
                db,
                message_id,
                DeliveryStatus::Failed,
                None,
                Some(UNCONFIRMED_ERROR.to_string()),
            )
            .await;
            match advanced {
                Ok(true) => {
                    broadcaster.broadcast(
                        events::names::MESSAGE_STATUS_UPDATE,
                        &MessageStatusUpdate {
                            message_id: message_id.to_string(),
                            status: DeliveryStatus::Failed.to_string(),
                            whatsapp_id: Some(external_id.to_string()),
                            error: Some(UNCONFIRMED_ERROR.to_string()),
                        },
                    );
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(message_id = %message_id, error = %e, "failed to record delivery failure")
                }
            }
        }
        // Best-effort: an unreachable provider is logged, never surfaced,
        // and the message keeps its current status.
        Err(e) => {
            warn!(
                message_id = %message_id,
                external_id = %external_id,
                error = %e,
                "delivery check unreachable, leaving status untouched"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Rig, drain, rig, seed_agent, seed_chat};
    use handover_core::DeliveryError;

    async fn sent_message(rig: &Rig) -> (i64, String) {
        seed_agent(&rig.db, "a1", "Alice").await;
        let chat_id = seed_chat(&rig.db, "+1555", &chrono::Utc::now().to_rfc3339()).await;
        rig.coordinator.takeover(chat_id, "a1").await.unwrap();
        let message = rig
            .coordinator
            .send_agent_message(chat_id, "a1", "hello")
            .await
            .unwrap();
        (chat_id, message.id)
    }

    #[tokio::test]
    async fn unconfirmed_delivery_is_forced_to_failed() {
        let mut rig = rig().await;
        let (_, message_id) = sent_message(&rig).await;
        drain(&mut rig.rx);

        rig.provider
            .queue_confirmation(Ok(DeliveryConfirmation::Unconfirmed))
            .await;
        rig.monitor.check_now(&message_id, "wamid.x").await;

        let message = queries::messages::get_message(&rig.db, &message_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.delivery_status, DeliveryStatus::Failed);
        assert_eq!(message.error.as_deref(), Some(UNCONFIRMED_ERROR));

        let events = drain(&mut rig.rx);
        assert_eq!(events[0]["event"], "message_status_update");
        assert_eq!(events[0]["data"]["status"], "failed");
        assert_eq!(events[0]["data"]["error"], UNCONFIRMED_ERROR);
    }

    #[tokio::test]
    async fn confirmed_delivery_advances_to_delivered() {
        let mut rig = rig().await;
        let (_, message_id) = sent_message(&rig).await;
        drain(&mut rig.rx);

        rig.provider
            .queue_confirmation(Ok(DeliveryConfirmation::Confirmed))
            .await;
        rig.monitor.check_now(&message_id, "wamid.x").await;

        let message = queries::messages::get_message(&rig.db, &message_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.delivery_status, DeliveryStatus::Delivered);

        let events = drain(&mut rig.rx);
        assert_eq!(events[0]["data"]["status"], "delivered");
    }

    #[tokio::test]
    async fn terminal_failed_is_never_overwritten_with_delivered() {
        let mut rig = rig().await;
        let (_, message_id) = sent_message(&rig).await;

        // Something else already failed this message.
        queries::messages::advance_delivery_status(
            &rig.db,
            &message_id,
            DeliveryStatus::Failed,
            None,
            Some("earlier failure".to_string()),
        )
        .await
        .unwrap();
        drain(&mut rig.rx);

        rig.provider
            .queue_confirmation(Ok(DeliveryConfirmation::Confirmed))
            .await;
        rig.monitor.check_now(&message_id, "wamid.x").await;

        let message = queries::messages::get_message(&rig.db, &message_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.delivery_status, DeliveryStatus::Failed);
        assert_eq!(message.error.as_deref(), Some("earlier failure"));
        assert!(drain(&mut rig.rx).is_empty());
    }

    #[tokio::test]
    async fn unreachable_provider_leaves_status_untouched() {
        let mut rig = rig().await;
        let (_, message_id) = sent_message(&rig).await;
        drain(&mut rig.rx);

        rig.provider
            .queue_confirmation(Err(DeliveryError::Timeout))
            .await;
        rig.monitor.check_now(&message_id, "wamid.x").await;

        let message = queries::messages::get_message(&rig.db, &message_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(message.delivery_status, DeliveryStatus::Sent);
        assert!(drain(&mut rig.rx).is_empty());
    }

    #[tokio::test]
    async fn check_for_unknown_message_is_a_noop() {
        let mut rig = rig().await;
        drain(&mut rig.rx);
        rig.monitor.check_now("no-such-message", "wamid.x").await;
        assert!(drain(&mut rig.rx).is_empty());
    }
}
