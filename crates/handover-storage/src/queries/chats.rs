// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation CRUD operations.

use handover_core::{ChatMode, ChatStatus, HandoverError};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::Chat;
use crate::queries::column_enum;

fn chat_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chat> {
    Ok(Chat {
        id: row.get(0)?,
        phone: row.get(1)?,
        profile_name: row.get(2)?,
        mode: column_enum::<ChatMode>(row, 3)?,
        assigned_agent_id: row.get(4)?,
        status: column_enum::<ChatStatus>(row, 5)?,
        last_activity_at: row.get(6)?,
    })
}

const CHAT_COLUMNS: &str =
    "id, phone, profile_name, mode, assigned_agent_id, status, last_activity_at";

/// Fetch a single conversation by id.
pub async fn get_chat(db: &Database, chat_id: i64) -> Result<Option<Chat>, HandoverError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE id = ?1"))?;
            let mut rows = stmt.query_map(params![chat_id], chat_from_row)?;
            rows.next().transpose().map_err(Into::into)
        })
        .await
        .map_err(map_tr_err)
}

/// Find the conversation for `phone`, creating it lazily on first contact.
///
/// A new conversation starts in automated mode with open status. An
/// existing conversation picks up a profile name if one arrives later.
pub async fn find_or_create_by_phone(
    db: &Database,
    phone: &str,
    profile_name: Option<&str>,
    now: &str,
) -> Result<Chat, HandoverError> {
    let phone = phone.to_string();
    let profile_name = profile_name.map(str::to_string);
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let existing = {
                let mut stmt = conn
                    .prepare(&format!("SELECT {CHAT_COLUMNS} FROM chats WHERE phone = ?1"))?;
                let mut rows = stmt.query_map(params![phone], chat_from_row)?;
                rows.next().transpose()?
            };

            if let Some(mut chat) = existing {
                if chat.profile_name.is_none()
                    && let Some(ref name) = profile_name
                {
                    conn.execute(
                        "UPDATE chats SET profile_name = ?2 WHERE id = ?1",
                        params![chat.id, name],
                    )?;
                    chat.profile_name = Some(name.clone());
                }
                return Ok(chat);
            }

            conn.execute(
                "INSERT INTO chats (phone, profile_name, mode, assigned_agent_id, status, last_activity_at)
                 VALUES (?1, ?2, 'automated', NULL, 'open', ?3)",
                params![phone, profile_name, now],
            )?;
            let id = conn.last_insert_rowid();
            Ok(Chat {
                id,
                phone,
                profile_name,
                mode: ChatMode::Automated,
                assigned_agent_id: None,
                status: ChatStatus::Open,
                last_activity_at: now,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Assign a conversation to a human agent.
///
/// Returns `false` when the chat does not exist. Re-assigning an
/// already-human chat succeeds (last writer wins).
pub async fn assign_agent(
    db: &Database,
    chat_id: i64,
    agent_id: &str,
    now: &str,
) -> Result<bool, HandoverError> {
    let agent_id = agent_id.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chats SET mode = 'human', assigned_agent_id = ?2,
                        status = 'assigned', last_activity_at = ?3
                 WHERE id = ?1",
                params![chat_id, agent_id, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Return a conversation to the automated responder.
///
/// Returns `false` when the chat does not exist. Releasing an automated
/// chat is a no-op that still reports success.
pub async fn release_to_automated(
    db: &Database,
    chat_id: i64,
    now: &str,
) -> Result<bool, HandoverError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE chats SET mode = 'automated', assigned_agent_id = NULL,
                        status = 'open', last_activity_at = ?2
                 WHERE id = ?1",
                params![chat_id, now],
            )?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_tr_err)
}

/// Bump a conversation's last-activity timestamp.
pub async fn touch_activity(db: &Database, chat_id: i64, now: &str) -> Result<(), HandoverError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE chats SET last_activity_at = ?2 WHERE id = ?1",
                params![chat_id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// All conversations, most recently active first.
pub async fn list_chats(db: &Database) -> Result<Vec<Chat>, HandoverError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CHAT_COLUMNS} FROM chats ORDER BY last_activity_at DESC, id"
            ))?;
            let rows = stmt.query_map([], chat_from_row)?;
            let mut chats = Vec::new();
            for row in rows {
                chats.push(row?);
            }
            Ok(chats)
        })
        .await
        .map_err(map_tr_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        (db, dir)
    }

    #[tokio::test]
    async fn find_or_create_is_lazy_and_stable() {
        let (db, _dir) = setup_db().await;

        let first = find_or_create_by_phone(&db, "+1555", Some("Sam"), "2026-01-01T00:00:00+00:00")
            .await
            .unwrap();
        assert_eq!(first.mode, ChatMode::Automated);
        assert_eq!(first.status, ChatStatus::Open);
        assert!(first.assigned_agent_id.is_none());

        let second =
            find_or_create_by_phone(&db, "+1555", None, "2026-01-01T01:00:00+00:00")
                .await
                .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.profile_name.as_deref(), Some("Sam"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn late_profile_name_is_picked_up() {
        let (db, _dir) = setup_db().await;

        let created = find_or_create_by_phone(&db, "+1555", None, "2026-01-01T00:00:00+00:00")
            .await
            .unwrap();
        assert!(created.profile_name.is_none());

        let updated =
            find_or_create_by_phone(&db, "+1555", Some("Sam"), "2026-01-01T00:01:00+00:00")
                .await
                .unwrap();
        assert_eq!(updated.profile_name.as_deref(), Some("Sam"));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn assign_and_release_round_trip() {
        let (db, _dir) = setup_db().await;

        crate::queries::agents::upsert_online(&db, "a1", "Alice", "c1", "2026-01-01T00:00:00+00:00")
            .await
            .unwrap();
        let chat = find_or_create_by_phone(&db, "+1555", None, "2026-01-01T00:00:00+00:00")
            .await
            .unwrap();

        assert!(
            assign_agent(&db, chat.id, "a1", "2026-01-01T00:01:00+00:00")
                .await
                .unwrap()
        );
        let assigned = get_chat(&db, chat.id).await.unwrap().unwrap();
        assert_eq!(assigned.mode, ChatMode::Human);
        assert_eq!(assigned.assigned_agent_id.as_deref(), Some("a1"));
        assert_eq!(assigned.status, ChatStatus::Assigned);

        assert!(
            release_to_automated(&db, chat.id, "2026-01-01T00:02:00+00:00")
                .await
                .unwrap()
        );
        let released = get_chat(&db, chat.id).await.unwrap().unwrap();
        assert_eq!(released.mode, ChatMode::Automated);
        assert!(released.assigned_agent_id.is_none());
        assert_eq!(released.status, ChatStatus::Open);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn assign_missing_chat_reports_not_found() {
        let (db, _dir) = setup_db().await;
        assert!(
            !assign_agent(&db, 4242, "a1", "2026-01-01T00:00:00+00:00")
                .await
                .unwrap()
        );
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_chats_orders_by_activity() {
        let (db, _dir) = setup_db().await;

        let older = find_or_create_by_phone(&db, "+1", None, "2026-01-01T00:00:00+00:00")
            .await
            .unwrap();
        let newer = find_or_create_by_phone(&db, "+2", None, "2026-01-01T02:00:00+00:00")
            .await
            .unwrap();

        let chats = list_chats(&db).await.unwrap();
        assert_eq!(chats[0].id, newer.id);
        assert_eq!(chats[1].id, older.id);

        db.close().await.unwrap();
    }
}
