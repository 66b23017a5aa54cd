// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Handover relay.
//!
//! This crate provides the error taxonomy, domain types, dashboard event
//! vocabulary, and the delivery-provider trait seam shared by the rest of
//! the workspace.

pub mod error;
pub mod events;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{AuthError, DeliveryError, HandoverError, SendError, TakeoverError};
pub use traits::DeliveryProvider;
pub use types::{
    AgentSummary, ChatMode, ChatStatus, DeliveryConfirmation, DeliveryReceipt, DeliveryStatus,
    Direction, OutboundKind, Sender,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn handover_error_has_all_variants() {
        let _config = HandoverError::Config("test".into());
        let _storage = HandoverError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _provider = HandoverError::Provider {
            message: "test".into(),
            source: None,
        };
        let _channel = HandoverError::Channel {
            message: "test".into(),
            source: None,
        };
        let _timeout = HandoverError::Timeout {
            duration: std::time::Duration::from_secs(10),
        };
        let _internal = HandoverError::Internal("test".into());
    }

    #[test]
    fn chat_mode_round_trips_through_text() {
        for mode in [ChatMode::Automated, ChatMode::Human] {
            let s = mode.to_string();
            assert_eq!(ChatMode::from_str(&s).unwrap(), mode);
        }
    }

    #[test]
    fn delivery_status_terminality() {
        assert!(!DeliveryStatus::Pending.is_terminal());
        assert!(!DeliveryStatus::Sent.is_terminal());
        assert!(DeliveryStatus::Delivered.is_terminal());
        assert!(DeliveryStatus::Failed.is_terminal());
    }
}
