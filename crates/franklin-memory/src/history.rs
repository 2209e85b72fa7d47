// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rolling conversation history per (user, channel).

use franklin_core::types::ProviderMessage;
use franklin_core::{Channel, Role};
use franklin_storage::queries::turns;
use franklin_storage::{ConversationTurn, Database, now_timestamp};
use tracing::{debug, warn};

/// Append-only transcript store. Writes fail silently, reads fail open.
#[derive(Clone)]
pub struct ConversationHistory {
    db: Database,
    default_limit: usize,
}

impl ConversationHistory {
    pub fn new(db: Database, default_limit: usize) -> Self {
        Self { db, default_limit }
    }

    /// Record a turn stamped with the current time.
    ///
    /// Returns the new turn's id, or `None` if the write failed (logged).
    pub async fn append(
        &self,
        user_id: &str,
        channel: Channel,
        role: Role,
        content: &str,
    ) -> Option<String> {
        let turn = ConversationTurn {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            channel,
            role,
            content: content.to_string(),
            created_at: now_timestamp(),
        };
        match turns::insert_turn(&self.db, &turn).await {
            Ok(()) => {
                debug!(user_id, %channel, %role, "turn appended");
                Some(turn.id)
            }
            Err(e) => {
                warn!(user_id, %channel, %role, error = %e, "failed to append turn");
                None
            }
        }
    }

    /// The most recent turns, oldest first. `None` uses the configured default.
    ///
    /// A scope with no history, or a failed read, yields an empty list.
    pub async fn recent(
        &self,
        user_id: &str,
        channel: Channel,
        limit: Option<usize>,
    ) -> Vec<ConversationTurn> {
        let limit = limit.unwrap_or(self.default_limit);
        if limit == 0 {
            return Vec::new();
        }
        match turns::recent_turns(&self.db, user_id, channel, limit).await {
            Ok(turns) => turns,
            Err(e) => {
                warn!(user_id, %channel, error = %e, "failed to load history");
                Vec::new()
            }
        }
    }
}

/// Map turns onto chat-completion messages, dropping system turns.
pub fn to_provider_messages(turns: &[ConversationTurn]) -> Vec<ProviderMessage> {
    turns
        .iter()
        .filter(|t| t.role != Role::System)
        .map(|t| ProviderMessage {
            role: t.role.as_str().to_string(),
            content: t.content.clone(),
        })
        .collect()
}
