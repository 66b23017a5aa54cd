// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery-provider trait for the outbound messaging collaborator.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::types::{DeliveryConfirmation, DeliveryReceipt, OutboundKind};

/// The external messaging provider, reduced to the two operations the
/// relay needs: deliver an outbound message and look up its confirmation.
///
/// Implementations classify failures into [`DeliveryError`] variants; the
/// relay's retry policy only re-attempts retryable ones.
#[async_trait]
pub trait DeliveryProvider: Send + Sync {
    /// Deliver `text` to `phone`, using the payload shape in `kind`.
    async fn deliver(
        &self,
        phone: &str,
        text: &str,
        kind: OutboundKind,
    ) -> Result<DeliveryReceipt, DeliveryError>;

    /// Look up delivery confirmation for a previously-returned receipt.
    async fn check_delivery(
        &self,
        external_id: &str,
    ) -> Result<DeliveryConfirmation, DeliveryError>;
}
