// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard-facing event vocabulary.
//!
//! Every broadcast is a named event with a typed payload. Payloads are
//! plain serde structs so the shape of each event is fixed at compile
//! time rather than assembled ad hoc at each call site.

use serde::{Deserialize, Serialize};

use crate::types::AgentSummary;

/// Event name constants for server -> client broadcasts.
pub mod names {
    /// Full roster broadcast.
    pub const AGENT_LIST_UPDATE: &str = "agent_list_update";
    /// Online-agent count broadcast.
    pub const AGENT_COUNT: &str = "agent_count";
    /// A conversation switched to human-assigned mode.
    pub const CHAT_TAKEN_OVER: &str = "chat_taken_over";
    /// An inbound end-user message was recorded.
    pub const NEW_MESSAGE: &str = "new_message";
    /// A human agent sent an outbound message.
    pub const NEW_MANUAL_MESSAGE: &str = "new_manual_message";
    /// The automated responder sent an outbound message.
    pub const NEW_AGENT_MESSAGE: &str = "new_agent_message";
    /// An outbound message's delivery status changed.
    pub const MESSAGE_STATUS_UPDATE: &str = "message_status_update";
    /// A conversation's mode changed.
    pub const CHAT_MODE_CHANGED: &str = "chat_mode_changed";
    /// An agent's connection went away.
    pub const AGENT_DISCONNECTED: &str = "agent_disconnected";
}

/// Payload of [`names::AGENT_COUNT`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCount {
    pub count: usize,
}

/// Payload of [`names::AGENT_LIST_UPDATE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentListUpdate {
    pub agents: Vec<AgentSummary>,
}

/// Payload of [`names::CHAT_TAKEN_OVER`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTakenOver {
    pub chat_id: i64,
    pub phone: String,
    pub profile_name: Option<String>,
    pub agent_id: String,
    pub agent_name: String,
}

/// Payload of [`names::NEW_MANUAL_MESSAGE`] and [`names::NEW_AGENT_MESSAGE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBroadcast {
    pub message_id: String,
    pub chat_id: i64,
    pub phone: String,
    pub content: String,
    pub sender: String,
    pub delivery_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    pub created_at: String,
}

/// Payload of [`names::MESSAGE_STATUS_UPDATE`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStatusUpdate {
    pub message_id: String,
    pub status: String,
    /// Provider delivery identifier, present once the provider accepted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Payload of [`names::CHAT_MODE_CHANGED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatModeChanged {
    pub chat_id: i64,
    pub is_ai_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
}

/// Payload of [`names::AGENT_DISCONNECTED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDisconnected {
    pub agent_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_update_omits_absent_fields() {
        let update = MessageStatusUpdate {
            message_id: "m1".to_string(),
            status: "sent".to_string(),
            whatsapp_id: Some("wamid.1".to_string()),
            error: None,
        };
        let json = serde_json::to_string(&update).unwrap();
        assert!(json.contains("\"whatsapp_id\":\"wamid.1\""));
        assert!(!json.contains("error"));
    }

    #[test]
    fn chat_taken_over_carries_agent_identity() {
        let event = ChatTakenOver {
            chat_id: 42,
            phone: "+15550001111".to_string(),
            profile_name: Some("Sam".to_string()),
            agent_id: "a1".to_string(),
            agent_name: "Alice".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["chat_id"], 42);
        assert_eq!(json["agent_name"], "Alice");
    }

    #[test]
    fn mode_changed_round_trips() {
        let event = ChatModeChanged {
            chat_id: 7,
            is_ai_active: true,
            agent_id: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        let parsed: ChatModeChanged = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, event);
    }
}
