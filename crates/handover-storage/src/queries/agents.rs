// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent presence CRUD operations.

use handover_core::{AgentSummary, HandoverError};
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::Agent;

/// Upsert an agent as online and bind it to a live connection.
pub async fn upsert_online(
    db: &Database,
    agent_id: &str,
    name: &str,
    connection_id: &str,
    now: &str,
) -> Result<(), HandoverError> {
    let agent_id = agent_id.to_string();
    let name = name.to_string();
    let connection_id = connection_id.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO agents (id, name, status, connection_id, last_active_at)
                 VALUES (?1, ?2, 'online', ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET
                     name = excluded.name,
                     status = 'online',
                     connection_id = excluded.connection_id,
                     last_active_at = excluded.last_active_at",
                params![agent_id, name, connection_id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Mark an agent offline and clear its connection binding.
pub async fn mark_offline(db: &Database, agent_id: &str, now: &str) -> Result<(), HandoverError> {
    let agent_id = agent_id.to_string();
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE agents SET status = 'offline', connection_id = NULL, last_active_at = ?2
                 WHERE id = ?1",
                params![agent_id, now],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a single agent by id.
pub async fn get_agent(db: &Database, agent_id: &str) -> Result<Option<Agent>, HandoverError> {
    let agent_id = agent_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, status, connection_id, last_active_at
                 FROM agents WHERE id = ?1",
            )?;
            let mut rows = stmt.query_map(params![agent_id], |row| {
                Ok(Agent {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    status: row.get(2)?,
                    connection_id: row.get(3)?,
                    last_active_at: row.get(4)?,
                })
            })?;
            rows.next().transpose().map_err(Into::into)
        })
        .await
        .map_err(map_tr_err)
}

/// The current roster: all online agents, most recently active first.
///
/// Read from durable state rather than the in-memory presence map so the
/// answer stays correct across registry/store divergence after a restart.
pub async fn list_online(db: &Database) -> Result<Vec<AgentSummary>, HandoverError> {
    db.connection()
        .call(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, status, last_active_at FROM agents
                 WHERE status = 'online'
                 ORDER BY last_active_at DESC, id",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(AgentSummary {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    status: row.get(2)?,
                    last_active_at: row.get(3)?,
                })
            })?;
            let mut agents = Vec::new();
            for row in rows {
                agents.push(row?);
            }
            Ok(agents)
        })
        .await
        .map_err(map_tr_err)
}
