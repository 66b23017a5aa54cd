// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fan-out of state-change events to connected dashboard clients.
//!
//! Each live connection registers an unbounded sender whose receiving
//! side is drained by that connection's writer task. Because producers
//! emit events for a given conversation while holding its guard, and each
//! per-connection channel is FIFO, every client observes the events of
//! one conversation in production order.

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Dispatcher owning the set of live dashboard connections.
#[derive(Default)]
pub struct Broadcaster {
    senders: DashMap<String, mpsc::UnboundedSender<String>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound channel under its connection id.
    pub fn register(&self, connection_id: String, tx: mpsc::UnboundedSender<String>) {
        self.senders.insert(connection_id, tx);
    }

    /// Remove a connection. Safe to call for unknown ids.
    pub fn unregister(&self, connection_id: &str) {
        self.senders.remove(connection_id);
    }

    /// Number of currently registered connections.
    pub fn connection_count(&self) -> usize {
        self.senders.len()
    }

    /// Fan `event` out to every registered connection.
    ///
    /// A failed send means the connection's writer task is gone; it is
    /// logged and the connection is left for the transport layer's own
    /// liveness detection to close. No retry.
    pub fn broadcast<T: Serialize>(&self, event: &str, payload: &T) {
        let envelope = match serde_json::to_string(&serde_json::json!({
            "event": event,
            "data": payload,
        })) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(event = %event, error = %e, "failed to serialize broadcast payload");
                return;
            }
        };

        for entry in self.senders.iter() {
            if entry.value().send(envelope.clone()).is_err() {
                debug!(
                    connection_id = %entry.key(),
                    event = %event,
                    "broadcast send failed, leaving connection to transport liveness"
                );
            }
        }
    }

    /// Broadcast a payload that is already a JSON value, under `event`.
    ///
    /// Used for webhook pass-through where the payload shape is not ours.
    pub fn broadcast_raw(&self, event: &str, payload: &serde_json::Value) {
        self.broadcast(event, payload);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize)]
    struct Probe {
        value: u32,
    }

    #[tokio::test]
    async fn broadcast_reaches_all_connections() {
        let broadcaster = Broadcaster::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        broadcaster.register("c1".to_string(), tx1);
        broadcaster.register("c2".to_string(), tx2);

        broadcaster.broadcast("probe", &Probe { value: 7 });

        for rx in [&mut rx1, &mut rx2] {
            let raw = rx.recv().await.unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(parsed["event"], "probe");
            assert_eq!(parsed["data"]["value"], 7);
        }
    }

    #[tokio::test]
    async fn per_connection_order_is_production_order() {
        let broadcaster = Broadcaster::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        broadcaster.register("c1".to_string(), tx);

        for value in 0..5 {
            broadcaster.broadcast("probe", &Probe { value });
        }

        for expected in 0..5 {
            let raw = rx.recv().await.unwrap();
            let parsed: serde_json::Value = serde_json::from_str(&raw).unwrap();
            assert_eq!(parsed["data"]["value"], expected);
        }
    }

    #[tokio::test]
    async fn dead_connection_does_not_block_others() {
        let broadcaster = Broadcaster::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        broadcaster.register("dead".to_string(), tx1);
        broadcaster.register("live".to_string(), tx2);
        drop(rx1);

        broadcaster.broadcast("probe", &Probe { value: 1 });

        let raw = rx2.recv().await.unwrap();
        assert!(raw.contains("probe"));
    }

    #[tokio::test]
    async fn unregister_stops_delivery() {
        let broadcaster = Broadcaster::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        broadcaster.register("c1".to_string(), tx);
        broadcaster.unregister("c1");
        assert_eq!(broadcaster.connection_count(), 0);

        broadcaster.broadcast("probe", &Probe { value: 1 });
        assert!(rx.try_recv().is_err());
    }
}
