// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.
//!
//! Messages are immutable once written, except for the delivery-status
//! fields. Status advancement is guarded in SQL so a terminal status
//! (`delivered`, `failed`) can never be overwritten by a late or
//! out-of-order update.

use handover_core::{DeliveryStatus, Direction, HandoverError, Sender};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::Message;
use crate::queries::column_enum;

const MESSAGE_COLUMNS: &str = "id, chat_id, sender, agent_id, content, direction, \
                               delivery_status, external_id, error, created_at";

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        chat_id: row.get(1)?,
        sender: column_enum::<Sender>(row, 2)?,
        agent_id: row.get(3)?,
        content: row.get(4)?,
        direction: column_enum::<Direction>(row, 5)?,
        delivery_status: column_enum::<DeliveryStatus>(row, 6)?,
        external_id: row.get(7)?,
        error: row.get(8)?,
        created_at: row.get(9)?,
    })
}

/// Insert a new message.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), HandoverError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO messages (id, chat_id, sender, agent_id, content, direction,
                                       delivery_status, external_id, error, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    msg.id,
                    msg.chat_id,
                    msg.sender.to_string(),
                    msg.agent_id,
                    msg.content,
                    msg.direction.to_string(),
                    msg.delivery_status.to_string(),
                    msg.external_id,
                    msg.error,
                    msg.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single message by id.
pub async fn get_message(db: &Database, message_id: &str) -> Result<Option<Message>, HandoverError> {
    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"))?;
            let mut rows = stmt.query_map(params![message_id], message_from_row)?;
            rows.next().transpose().map_err(Into::into)
        })
        .await
        .map_err(map_tr_err)
}

/// Get messages for a conversation in chronological order.
pub async fn get_messages_for_chat(
    db: &Database,
    chat_id: i64,
    limit: Option<i64>,
) -> Result<Vec<Message>, HandoverError> {
    db.connection()
        .call(move |conn| {
            let sql = match limit {
                Some(_) => format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1
                     ORDER BY created_at ASC LIMIT ?2"
                ),
                None => format!(
                    "SELECT {MESSAGE_COLUMNS} FROM messages WHERE chat_id = ?1
                     ORDER BY created_at ASC"
                ),
            };
            let mut stmt = conn.prepare(&sql)?;
            let mut messages = Vec::new();
            match limit {
                Some(lim) => {
                    let rows = stmt.query_map(params![chat_id, lim], message_from_row)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
                None => {
                    let rows = stmt.query_map(params![chat_id], message_from_row)?;
                    for row in rows {
                        messages.push(row?);
                    }
                }
            }
            Ok(messages)
        })
        .await
        .map_err(map_tr_err)
}

/// Advance a message's delivery status, enforcing monotonic transitions.
///
/// Returns `true` if the row changed. A `false` return means the message
/// does not exist or the transition was not allowed from its current
/// status (e.g. the confirmation monitor arriving after a terminal state).
pub async fn advance_delivery_status(
    db: &Database,
    message_id: &str,
    status: DeliveryStatus,
    external_id: Option<String>,
    error: Option<String>,
) -> Result<bool, HandoverError> {
    // Which current statuses may move to the requested one.
    let guard = match status {
        DeliveryStatus::Pending => return Ok(false),
        DeliveryStatus::Sent => "delivery_status = 'pending'",
        DeliveryStatus::Delivered => "delivery_status IN ('pending', 'sent')",
        DeliveryStatus::Failed => "delivery_status NOT IN ('delivered', 'failed')",
    };

    let message_id = message_id.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                &format!(
                    "UPDATE messages SET delivery_status = ?2,
                            external_id = COALESCE(?3, external_id),
                            error = ?4
                     WHERE id = ?1 AND {guard}"
                ),
                params![message_id, status.to_string(), external_id, error],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}
