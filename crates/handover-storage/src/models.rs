// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.

use handover_core::{ChatMode, ChatStatus, DeliveryStatus, Direction, Sender};
use serde::Serialize;

/// A human agent record. Created/updated on authenticate, flipped offline
/// on disconnect, never hard-deleted.
#[derive(Debug, Clone, Serialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    /// `online` or `offline`.
    pub status: String,
    /// Live transport connection id, present while online.
    pub connection_id: Option<String>,
    pub last_active_at: String,
}

/// One end-user conversation thread.
#[derive(Debug, Clone, Serialize)]
pub struct Chat {
    pub id: i64,
    pub phone: String,
    pub profile_name: Option<String>,
    pub mode: ChatMode,
    /// Present iff `mode == ChatMode::Human`.
    pub assigned_agent_id: Option<String>,
    pub status: ChatStatus,
    pub last_activity_at: String,
}

/// A stored message. Immutable except for the delivery-status fields.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: String,
    pub chat_id: i64,
    pub sender: Sender,
    /// Present iff `sender == Sender::Agent`.
    pub agent_id: Option<String>,
    pub content: String,
    pub direction: Direction,
    pub delivery_status: DeliveryStatus,
    /// The provider's delivery identifier, once accepted.
    pub external_id: Option<String>,
    /// Failure description when `delivery_status == Failed`.
    pub error: Option<String>,
    pub created_at: String,
}
