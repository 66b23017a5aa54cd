// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-conversation state machine: takeover protocol and message-send
//! protocol with delivery tracking.
//!
//! Every state-changing operation acquires the conversation's guard
//! before its first read and holds it across all suspension points, so
//! two concurrent sends, or a concurrent takeover and send, on the same
//! chat serialize. The conversation mode is re-read from the store inside
//! the guard immediately before any message is persisted; a mode captured
//! before a suspension point is never trusted.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{info, warn};

use handover_core::events::{
    self, ChatModeChanged, ChatTakenOver, MessageBroadcast, MessageStatusUpdate,
};
use handover_core::{
    ChatMode, DeliveryProvider, DeliveryStatus, Direction, HandoverError, OutboundKind, SendError,
    Sender, TakeoverError,
};
use handover_storage::{Chat, Database, Message, queries};

use crate::broadcast::Broadcaster;
use crate::monitor::DeliveryMonitor;
use crate::retry::RetryPolicy;

/// Coordinates all state-changing operations on conversations.
pub struct ChatCoordinator {
    db: Database,
    provider: Arc<dyn DeliveryProvider>,
    broadcaster: Arc<Broadcaster>,
    monitor: Arc<DeliveryMonitor>,
    retry: RetryPolicy,
    session_window: chrono::Duration,
    /// Per-conversation guards serializing takeover/send on the same chat.
    guards: DashMap<i64, Arc<Mutex<()>>>,
}

impl ChatCoordinator {
    pub fn new(
        db: Database,
        provider: Arc<dyn DeliveryProvider>,
        broadcaster: Arc<Broadcaster>,
        monitor: Arc<DeliveryMonitor>,
        retry: RetryPolicy,
        session_window_hours: i64,
    ) -> Self {
        Self {
            db,
            provider,
            broadcaster,
            monitor,
            retry,
            session_window: chrono::Duration::hours(session_window_hours),
            guards: DashMap::new(),
        }
    }

    fn chat_guard(&self, chat_id: i64) -> Arc<Mutex<()>> {
        self.guards
            .entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Switch a conversation to human-assigned mode.
    ///
    /// Taking over an already-assigned chat succeeds and reassigns it
    /// (last writer wins).
    pub async fn takeover(&self, chat_id: i64, agent_id: &str) -> Result<Chat, TakeoverError> {
        let guard = self.chat_guard(chat_id);
        let _held = guard.lock().await;

        let now = chrono::Utc::now().to_rfc3339();
        let agent_name = queries::agents::get_agent(&self.db, agent_id)
            .await
            .map_err(TakeoverError::Store)?
            .map(|a| a.name)
            .unwrap_or_else(|| agent_id.to_string());

        if !queries::chats::assign_agent(&self.db, chat_id, agent_id, &now)
            .await
            .map_err(TakeoverError::Store)?
        {
            return Err(TakeoverError::ChatNotFound(chat_id));
        }

        let chat = queries::chats::get_chat(&self.db, chat_id)
            .await
            .map_err(TakeoverError::Store)?
            .ok_or(TakeoverError::ChatNotFound(chat_id))?;

        info!(chat_id, agent_id = %agent_id, "chat taken over");

        self.broadcaster.broadcast(
            events::names::CHAT_TAKEN_OVER,
            &ChatTakenOver {
                chat_id,
                phone: chat.phone.clone(),
                profile_name: chat.profile_name.clone(),
                agent_id: agent_id.to_string(),
                agent_name,
            },
        );
        self.broadcaster.broadcast(
            events::names::CHAT_MODE_CHANGED,
            &ChatModeChanged {
                chat_id,
                is_ai_active: false,
                agent_id: Some(agent_id.to_string()),
            },
        );

        Ok(chat)
    }

    /// Return a conversation to the automated responder.
    ///
    /// Idempotent on an already-automated chat.
    pub async fn release_chat(&self, chat_id: i64) -> Result<Chat, TakeoverError> {
        let guard = self.chat_guard(chat_id);
        let _held = guard.lock().await;

        let now = chrono::Utc::now().to_rfc3339();
        if !queries::chats::release_to_automated(&self.db, chat_id, &now)
            .await
            .map_err(TakeoverError::Store)?
        {
            return Err(TakeoverError::ChatNotFound(chat_id));
        }

        let chat = queries::chats::get_chat(&self.db, chat_id)
            .await
            .map_err(TakeoverError::Store)?
            .ok_or(TakeoverError::ChatNotFound(chat_id))?;

        info!(chat_id, "chat released to automated responder");

        self.broadcaster.broadcast(
            events::names::CHAT_MODE_CHANGED,
            &ChatModeChanged {
                chat_id,
                is_ai_active: true,
                agent_id: None,
            },
        );

        Ok(chat)
    }

    /// Send an outbound message from a human agent.
    ///
    /// Sequence: mode check, pending insert, immediate broadcast for
    /// responsive UI, provider delivery under the retry policy, status
    /// update, status broadcast. The pending insert and the provider call
    /// are not atomic with each other; a crash between them leaves the
    /// message `pending` permanently, which the dashboard shows as-is.
    pub async fn send_agent_message(
        &self,
        chat_id: i64,
        agent_id: &str,
        text: &str,
    ) -> Result<Message, SendError> {
        let guard = self.chat_guard(chat_id);
        let _held = guard.lock().await;

        // Current mode, read under the guard. An automated chat rejects
        // the send before anything is persisted.
        let chat = queries::chats::get_chat(&self.db, chat_id)
            .await
            .map_err(SendError::Store)?
            .ok_or(SendError::ChatNotFound(chat_id))?;
        if chat.mode != ChatMode::Human {
            return Err(SendError::WrongMode { chat_id });
        }

        let kind = self.outbound_kind(&chat);
        let agent_name = queries::agents::get_agent(&self.db, agent_id)
            .await
            .map_err(SendError::Store)?
            .map(|a| a.name);

        let now = chrono::Utc::now().to_rfc3339();
        let mut message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id,
            sender: Sender::Agent,
            agent_id: Some(agent_id.to_string()),
            content: text.to_string(),
            direction: Direction::Outgoing,
            delivery_status: DeliveryStatus::Pending,
            external_id: None,
            error: None,
            created_at: now.clone(),
        };

        queries::messages::insert_message(&self.db, &message)
            .await
            .map_err(SendError::Store)?;
        queries::chats::touch_activity(&self.db, chat_id, &now)
            .await
            .map_err(SendError::Store)?;

        self.broadcaster.broadcast(
            events::names::NEW_MANUAL_MESSAGE,
            &broadcast_payload(&message, &chat, agent_name),
        );

        let delivery = self
            .retry
            .run(|| self.provider.deliver(&chat.phone, text, kind))
            .await;

        match delivery {
            Ok(receipt) => {
                queries::messages::advance_delivery_status(
                    &self.db,
                    &message.id,
                    DeliveryStatus::Sent,
                    Some(receipt.external_id.clone()),
                    None,
                )
                .await
                .map_err(SendError::Store)?;

                self.broadcaster.broadcast(
                    events::names::MESSAGE_STATUS_UPDATE,
                    &MessageStatusUpdate {
                        message_id: message.id.clone(),
                        status: DeliveryStatus::Sent.to_string(),
                        whatsapp_id: Some(receipt.external_id.clone()),
                        error: None,
                    },
                );

                self.monitor
                    .schedule(message.id.clone(), receipt.external_id.clone());

                message.delivery_status = DeliveryStatus::Sent;
                message.external_id = Some(receipt.external_id);
                Ok(message)
            }
            Err(err) => {
                let description = err.to_string();
                if let Err(store_err) = queries::messages::advance_delivery_status(
                    &self.db,
                    &message.id,
                    DeliveryStatus::Failed,
                    None,
                    Some(description.clone()),
                )
                .await
                {
                    warn!(
                        message_id = %message.id,
                        error = %store_err,
                        "failed to record delivery failure"
                    );
                }

                self.broadcaster.broadcast(
                    events::names::MESSAGE_STATUS_UPDATE,
                    &MessageStatusUpdate {
                        message_id: message.id.clone(),
                        status: DeliveryStatus::Failed.to_string(),
                        whatsapp_id: None,
                        error: Some(description),
                    },
                );

                Err(err.into())
            }
        }
    }

    /// Record an inbound end-user message, creating the conversation
    /// lazily on first contact.
    pub async fn record_incoming_message(
        &self,
        phone: &str,
        profile_name: Option<&str>,
        text: &str,
    ) -> Result<Message, HandoverError> {
        let now = chrono::Utc::now().to_rfc3339();
        let chat =
            queries::chats::find_or_create_by_phone(&self.db, phone, profile_name, &now).await?;

        let guard = self.chat_guard(chat.id);
        let _held = guard.lock().await;

        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id: chat.id,
            sender: Sender::User,
            agent_id: None,
            content: text.to_string(),
            direction: Direction::Incoming,
            // An incoming message has arrived by definition; the
            // pending/sent lifecycle applies to outgoing only.
            delivery_status: DeliveryStatus::Delivered,
            external_id: None,
            error: None,
            created_at: now.clone(),
        };

        queries::messages::insert_message(&self.db, &message).await?;
        queries::chats::touch_activity(&self.db, chat.id, &now).await?;

        self.broadcaster.broadcast(
            events::names::NEW_MESSAGE,
            &broadcast_payload(&message, &chat, None),
        );

        Ok(message)
    }

    /// Record an outbound reply already delivered by the automated
    /// responder pipeline.
    ///
    /// Rejected with `WrongMode` when a human agent owns the chat: the
    /// automated responder must not talk over an assigned conversation.
    pub async fn record_automated_reply(
        &self,
        chat_id: i64,
        text: &str,
        external_id: Option<String>,
    ) -> Result<Message, SendError> {
        let guard = self.chat_guard(chat_id);
        let _held = guard.lock().await;

        let chat = queries::chats::get_chat(&self.db, chat_id)
            .await
            .map_err(SendError::Store)?
            .ok_or(SendError::ChatNotFound(chat_id))?;
        if chat.mode != ChatMode::Automated {
            return Err(SendError::WrongMode { chat_id });
        }

        let now = chrono::Utc::now().to_rfc3339();
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            chat_id,
            sender: Sender::Assistant,
            agent_id: None,
            content: text.to_string(),
            direction: Direction::Outgoing,
            delivery_status: DeliveryStatus::Sent,
            external_id: external_id.clone(),
            error: None,
            created_at: now.clone(),
        };

        queries::messages::insert_message(&self.db, &message)
            .await
            .map_err(SendError::Store)?;
        queries::chats::touch_activity(&self.db, chat_id, &now)
            .await
            .map_err(SendError::Store)?;

        self.broadcaster.broadcast(
            events::names::NEW_AGENT_MESSAGE,
            &broadcast_payload(&message, &chat, None),
        );

        if let Some(external_id) = external_id {
            self.monitor.schedule(message.id.clone(), external_id);
        }

        Ok(message)
    }

    /// Payload shape for this send, derived from elapsed time since the
    /// conversation's last activity. Computed per send, never cached: the
    /// answer changes continuously.
    fn outbound_kind(&self, chat: &Chat) -> OutboundKind {
        let last_activity = match chrono::DateTime::parse_from_rfc3339(&chat.last_activity_at) {
            Ok(ts) => ts.with_timezone(&chrono::Utc),
            Err(_) => {
                warn!(
                    chat_id = chat.id,
                    last_activity_at = %chat.last_activity_at,
                    "unparseable last-activity timestamp, treating session as stale"
                );
                return OutboundKind::Template;
            }
        };

        let elapsed = chrono::Utc::now().signed_duration_since(last_activity);
        if elapsed < self.session_window {
            OutboundKind::Session
        } else {
            OutboundKind::Template
        }
    }
}

fn broadcast_payload(message: &Message, chat: &Chat, agent_name: Option<String>) -> MessageBroadcast {
    MessageBroadcast {
        message_id: message.id.clone(),
        chat_id: message.chat_id,
        phone: chat.phone.clone(),
        content: message.content.clone(),
        sender: message.sender.to_string(),
        delivery_status: message.delivery_status.to_string(),
        agent_id: message.agent_id.clone(),
        agent_name,
        created_at: message.created_at.clone(),
    }
}
