// SPDX-FileCopyrightText: 2026 Handover Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Agent presence registry.
//!
//! The connection -> agent map is the single source of truth for "who is
//! online now" and is mutated only by [`PresenceRegistry::authenticate`]
//! and [`PresenceRegistry::release`]. The map is in-memory and lost on
//! restart; recovery is full re-authentication by dashboard clients. The
//! store remains authoritative for agent records, so roster reads go to
//! the store rather than the map.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{info, warn};

use handover_core::events::{self, AgentCount, AgentDisconnected, AgentListUpdate};
use handover_core::{AgentSummary, AuthError, HandoverError};
use handover_storage::{Database, queries};

use crate::broadcast::Broadcaster;

/// Registry of live dashboard connections and their agent bindings.
pub struct PresenceRegistry {
    db: Database,
    broadcaster: Arc<Broadcaster>,
    /// connection id -> agent id, set at authenticate time (1:1).
    connections: DashMap<String, String>,
}

impl PresenceRegistry {
    pub fn new(db: Database, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            db,
            broadcaster,
            connections: DashMap::new(),
        }
    }

    /// Authenticate a connection as an agent.
    ///
    /// Requires non-empty agent id and name. The durable upsert runs
    /// first; only on its success is the connection mapping recorded, so
    /// a store failure leaves no partial state. The caller is expected to
    /// close the connection on error.
    pub async fn authenticate(
        &self,
        connection_id: &str,
        agent_id: &str,
        name: &str,
    ) -> Result<AgentSummary, AuthError> {
        let agent_id = agent_id.trim();
        let name = name.trim();
        if agent_id.is_empty() || name.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let now = chrono::Utc::now().to_rfc3339();
        queries::agents::upsert_online(&self.db, agent_id, name, connection_id, &now).await?;

        self.connections
            .insert(connection_id.to_string(), agent_id.to_string());

        info!(
            agent_id = %agent_id,
            connection_id = %connection_id,
            "agent authenticated"
        );
        self.broadcast_roster().await;

        Ok(AgentSummary {
            id: agent_id.to_string(),
            name: name.to_string(),
            status: "online".to_string(),
            last_active_at: now,
        })
    }

    /// Release a connection's agent binding.
    ///
    /// Idempotent: a connection that never authenticated, or was already
    /// released, is a no-op with no broadcast.
    pub async fn release(&self, connection_id: &str) {
        let Some((_, agent_id)) = self.connections.remove(connection_id) else {
            return;
        };

        let now = chrono::Utc::now().to_rfc3339();
        if let Err(e) = queries::agents::mark_offline(&self.db, &agent_id, &now).await {
            // The in-memory mapping is already gone; the durable row will
            // be reconciled on the agent's next authenticate.
            warn!(agent_id = %agent_id, error = %e, "failed to mark agent offline");
        }

        info!(agent_id = %agent_id, connection_id = %connection_id, "agent disconnected");
        self.broadcaster.broadcast(
            events::names::AGENT_DISCONNECTED,
            &AgentDisconnected {
                agent_id: agent_id.clone(),
            },
        );
        self.broadcast_roster().await;
    }

    /// The agent bound to `connection_id`, if any.
    pub fn agent_for_connection(&self, connection_id: &str) -> Option<String> {
        self.connections
            .get(connection_id)
            .map(|entry| entry.value().clone())
    }

    /// All online agents, read from durable state.
    pub async fn current_roster(&self) -> Result<Vec<AgentSummary>, HandoverError> {
        queries::agents::list_online(&self.db).await
    }

    /// Whether any human agent is currently online.
    pub async fn human_available(&self) -> Result<bool, HandoverError> {
        Ok(!self.current_roster().await?.is_empty())
    }

    async fn broadcast_roster(&self) {
        match self.current_roster().await {
            Ok(roster) => {
                self.broadcaster.broadcast(
                    events::names::AGENT_COUNT,
                    &AgentCount {
                        count: roster.len(),
                    },
                );
                self.broadcaster.broadcast(
                    events::names::AGENT_LIST_UPDATE,
                    &AgentListUpdate { agents: roster },
                );
            }
            Err(e) => warn!(error = %e, "failed to read roster for broadcast"),
        }
    }
}
