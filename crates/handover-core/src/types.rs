// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain types shared across the Handover workspace.
//!
//! The status enums round-trip through their lowercase text forms, which
//! is also how they are stored in SQLite TEXT columns.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Who currently drives a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// The automated responder owns the conversation.
    Automated,
    /// A human agent has taken the conversation over.
    Human,
}

/// Conversation lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ChatStatus {
    Open,
    Assigned,
    Closed,
}

/// Lifecycle of an outbound message's confirmation by the provider.
///
/// Transitions are monotonic: `pending -> sent -> delivered`, and any
/// non-terminal status may move to `failed`. `Delivered` and `Failed`
/// are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    /// Terminal statuses are never overwritten, not even by the
    /// delivery-confirmation monitor.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Failed)
    }
}

/// Originator of a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The end user on the messaging platform.
    User,
    /// The automated responder.
    Assistant,
    /// A human agent on the dashboard.
    Agent,
}

/// Message direction relative to this system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// Outbound payload shape, decided per send from the 24-hour session
/// window: conversations with recent activity get a free-form session
/// message, stale ones must use a pre-approved template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboundKind {
    /// Free-form text within the provider's active session window.
    Session,
    /// Pre-approved template message (required outside the window).
    Template,
}

/// A currently-registered agent as shown in roster broadcasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSummary {
    /// Stable, client-supplied agent identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// `online` or `offline`.
    pub status: String,
    /// RFC 3339 timestamp of the last presence change.
    pub last_active_at: String,
}

/// Receipt returned by a successful provider delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReceipt {
    /// The provider's delivery identifier (e.g. a WhatsApp message id).
    pub external_id: String,
}

/// Result of a delivery-confirmation lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryConfirmation {
    /// The provider confirmed the message reached the recipient.
    Confirmed,
    /// The provider knows the message but has no delivery confirmation.
    Unconfirmed,
}
