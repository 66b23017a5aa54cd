// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Coordination core of the Handover relay: agent presence, the
//! per-conversation handoff state machine, event fan-out to dashboards,
//! and deferred delivery-confirmation checks.
//!
//! Concurrency model: single process, tokio cooperative scheduling.
//! State-changing operations on one conversation serialize behind that
//! conversation's guard; the presence map is mutated only by
//! authenticate/release. Everything durable lives in `handover-storage`.

pub mod broadcast;
pub mod coordinator;
pub mod monitor;
pub mod presence;
pub mod retry;

#[cfg(test)]
pub(crate) mod testing;

pub use broadcast::Broadcaster;
pub use coordinator::ChatCoordinator;
pub use monitor::DeliveryMonitor;
pub use presence::PresenceRegistry;
pub use retry::RetryPolicy;
