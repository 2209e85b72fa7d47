// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation turn operations.

use franklin_core::{Channel, FranklinError};
use rusqlite::params;

use crate::database::{map_tr_err, Database};
use crate::models::ConversationTurn;
use crate::queries::parse_column;

/// Append a turn.
pub async fn insert_turn(db: &Database, turn: &ConversationTurn) -> Result<(), FranklinError> {
    let turn = turn.clone();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO conversation_turns (id, user_id, channel, role, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    turn.id,
                    turn.user_id,
                    turn.channel.as_str(),
                    turn.role.as_str(),
                    turn.content,
                    turn.created_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// The `limit` most recent turns for a scope, returned oldest first.
///
/// Selection is newest-first by timestamp with insertion sequence breaking
/// ties; the slice is then reversed into reading order.
pub async fn recent_turns(
    db: &Database,
    user_id: &str,
    channel: Channel,
    limit: usize,
) -> Result<Vec<ConversationTurn>, FranklinError> {
    let user_id = user_id.to_string();
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, channel, role, content, created_at
                 FROM conversation_turns
                 WHERE user_id = ?1 AND channel = ?2
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?3",
            )?;
            let rows = stmt.query_map(params![user_id, channel.as_str(), limit], |row| {
                Ok(ConversationTurn {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    channel: parse_column(row, 2)?,
                    role: parse_column(row, 3)?,
                    content: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?;
            let mut turns = rows.collect::<Result<Vec<_>, _>>()?;
            turns.reverse();
            Ok(turns)
        })
        .await
        .map_err(map_tr_err)
}

/// Number of turns stored for a scope.
pub async fn count_turns(
    db: &Database,
    user_id: &str,
    channel: Channel,
) -> Result<u64, FranklinError> {
    let user_id = user_id.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM conversation_turns WHERE user_id = ?1 AND channel = ?2",
                params![user_id, channel.as_str()],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map(|n| n.max(0) as u64)
        .map_err(map_tr_err)
}
