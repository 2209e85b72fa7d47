// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed memory store with vector BLOB storage.
//!
//! Similarity is computed in Rust on the database thread: rows for the
//! requested scope are scanned, scored with cosine similarity, filtered by
//! threshold, and the top `limit` returned.

use async_trait::async_trait;
use franklin_core::{Channel, FranklinError};
use franklin_storage::map_tr_err;
use franklin_storage::queries::parse_column;
use rusqlite::{OptionalExtension, params};
use tokio_rusqlite::Connection;

use crate::types::{Memory, MemoryType, ScoredMemory, blob_to_vec, cosine_similarity, vec_to_blob};

const MEMORY_COLUMNS: &str = "id, user_id, channel, memory_type, content, embedding, importance, created_at, last_accessed_at, access_count";

/// A filtered top-k similarity query.
#[derive(Debug, Clone)]
pub struct MatchQuery {
    pub embedding: Vec<f32>,
    pub user_id: String,
    pub channel: Channel,
    /// Minimum cosine similarity for a row to be returned.
    pub threshold: f32,
    pub limit: usize,
}

/// A vector index supporting scoped top-k cosine search.
///
/// Results are ordered by similarity descending and never include rows from
/// another (user, channel) scope.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn match_memories(&self, query: MatchQuery) -> Result<Vec<ScoredMemory>, FranklinError>;
}

/// Persistent store for memories in SQLite.
#[derive(Clone)]
pub struct MemoryStore {
    conn: Connection,
}

impl MemoryStore {
    /// Wraps a connection that already has the schema migrated.
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    /// Persist a fully-formed memory.
    pub async fn insert(&self, memory: &Memory) -> Result<(), FranklinError> {
        let memory = memory.clone();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO memories (id, user_id, channel, memory_type, content, embedding, importance, created_at, last_accessed_at, access_count)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    params![
                        memory.id,
                        memory.user_id,
                        memory.channel.as_str(),
                        memory.memory_type.as_str(),
                        memory.content,
                        vec_to_blob(&memory.embedding),
                        memory.importance,
                        memory.created_at,
                        memory.last_accessed_at,
                        memory.access_count,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    /// Get a memory by ID.
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Memory>, FranklinError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let sql = format!("SELECT {MEMORY_COLUMNS} FROM memories WHERE id = ?1");
                conn.query_row(&sql, params![id], row_to_memory).optional()
            })
            .await
            .map_err(map_tr_err)
    }

    /// All memories for a scope, most important first, newest first within
    /// equal importance.
    pub async fn list_for_scope(
        &self,
        user_id: &str,
        channel: Channel,
        memory_type: Option<MemoryType>,
    ) -> Result<Vec<Memory>, FranklinError> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories
                     WHERE user_id = ?1 AND channel = ?2 AND (?3 IS NULL OR memory_type = ?3)
                     ORDER BY importance DESC, created_at DESC, rowid DESC"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(
                    params![user_id, channel.as_str(), memory_type.map(|t| t.as_str())],
                    row_to_memory,
                )?;
                rows.collect::<Result<Vec<_>, _>>()
            })
            .await
            .map_err(map_tr_err)
    }

    /// Number of memories stored for a scope.
    pub async fn count_for_scope(
        &self,
        user_id: &str,
        channel: Channel,
    ) -> Result<u64, FranklinError> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM memories WHERE user_id = ?1 AND channel = ?2",
                    params![user_id, channel.as_str()],
                    |row| row.get::<_, i64>(0),
                )
            })
            .await
            .map(|n| n.max(0) as u64)
            .map_err(map_tr_err)
    }

    /// Hard delete. Returns whether a row was removed.
    pub async fn delete(&self, id: &str) -> Result<bool, FranklinError> {
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let removed = conn.execute("DELETE FROM memories WHERE id = ?1", params![id])?;
                Ok(removed > 0)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Set `last_accessed_at` and increment `access_count` for each id.
    ///
    /// Unknown ids are skipped. Returns the number of rows updated.
    pub async fn record_access(&self, ids: &[String], at: &str) -> Result<usize, FranklinError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids = ids.to_vec();
        let at = at.to_string();
        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                let mut updated = 0;
                {
                    let mut stmt = tx.prepare(
                        "UPDATE memories SET last_accessed_at = ?1, access_count = access_count + 1 WHERE id = ?2",
                    )?;
                    for id in &ids {
                        updated += stmt.execute(params![at, id])?;
                    }
                }
                tx.commit()?;
                Ok(updated)
            })
            .await
            .map_err(map_tr_err)
    }

    /// Delete memories below `importance_below` whose last access (or
    /// creation, if never accessed) is strictly before `cutoff`.
    pub async fn delete_decayed(
        &self,
        importance_below: u8,
        cutoff: &str,
    ) -> Result<usize, FranklinError> {
        let cutoff = cutoff.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM memories
                     WHERE importance < ?1 AND COALESCE(last_accessed_at, created_at) < ?2",
                    params![importance_below, cutoff],
                )
            })
            .await
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl VectorIndex for MemoryStore {
    async fn match_memories(&self, query: MatchQuery) -> Result<Vec<ScoredMemory>, FranklinError> {
        if query.limit == 0 {
            return Ok(Vec::new());
        }
        self.conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {MEMORY_COLUMNS} FROM memories WHERE user_id = ?1 AND channel = ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(
                    params![query.user_id, query.channel.as_str()],
                    row_to_memory,
                )?;

                let mut scored = Vec::new();
                for row in rows {
                    let memory = row?;
                    let similarity = cosine_similarity(&query.embedding, &memory.embedding);
                    if similarity >= query.threshold {
                        scored.push(ScoredMemory { memory, similarity });
                    }
                }
                scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
                scored.truncate(query.limit);
                Ok(scored)
            })
            .await
            .map_err(map_tr_err)
    }
}

fn row_to_memory(row: &rusqlite::Row<'_>) -> rusqlite::Result<Memory> {
    let blob: Vec<u8> = row.get(5)?;
    let memory_type: String = row.get(3)?;
    Ok(Memory {
        id: row.get(0)?,
        user_id: row.get(1)?,
        channel: parse_column(row, 2)?,
        memory_type: MemoryType::from_lenient(&memory_type),
        content: row.get(4)?,
        embedding: blob_to_vec(&blob),
        importance: row.get(6)?,
        created_at: row.get(7)?,
        last_accessed_at: row.get(8)?,
        access_count: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use franklin_storage::Database;
    use tempfile::tempdir;

    async fn setup() -> (MemoryStore, Database, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("memory.db");
        let db = Database::open(path.to_str().unwrap()).await.unwrap();
        (MemoryStore::new(db.connection().clone()), db, dir)
    }

    fn memory(id: &str, user: &str, importance: u8, embedding: Vec<f32>, created_at: &str) -> Memory {
        Memory {
            id: id.to_string(),
            user_id: user.to_string(),
            channel: Channel::Telegram,
            memory_type: MemoryType::Fact,
            content: format!("content of {id}"),
            embedding,
            importance,
            created_at: created_at.to_string(),
            last_accessed_at: None,
            access_count: 0,
        }
    }

    #[tokio::test]
    async fn insert_and_get_round_trip() {
        let (store, db, _dir) = setup().await;
        let m = memory("m1", "u1", 7, vec![0.1, 0.2, 0.3], "2026-01-01T00:00:00.000Z");
        store.insert(&m).await.unwrap();

        let loaded = store.get_by_id("m1").await.unwrap().unwrap();
        assert_eq!(loaded, m);
        assert!(store.get_by_id("missing").await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_orders_by_importance_then_recency() {
        let (store, db, _dir) = setup().await;
        store.insert(&memory("low", "u1", 3, vec![1.0], "2026-01-03T00:00:00.000Z")).await.unwrap();
        store.insert(&memory("old", "u1", 8, vec![1.0], "2026-01-01T00:00:00.000Z")).await.unwrap();
        store.insert(&memory("new", "u1", 8, vec![1.0], "2026-01-02T00:00:00.000Z")).await.unwrap();
        store.insert(&memory("other", "u2", 9, vec![1.0], "2026-01-02T00:00:00.000Z")).await.unwrap();

        let ids: Vec<String> = store
            .list_for_scope("u1", Channel::Telegram, None)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.id)
            .collect();
        assert_eq!(ids, vec!["new", "old", "low"]);
        assert_eq!(store.count_for_scope("u1", Channel::Telegram).await.unwrap(), 3);
        assert_eq!(store.count_for_scope("u1", Channel::Web).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_by_type() {
        let (store, db, _dir) = setup().await;
        let mut pref = memory("p", "u1", 5, vec![1.0], "2026-01-01T00:00:00.000Z");
        pref.memory_type = MemoryType::Preference;
        store.insert(&pref).await.unwrap();
        store.insert(&memory("f", "u1", 5, vec![1.0], "2026-01-01T00:00:00.000Z")).await.unwrap();

        let prefs = store
            .list_for_scope("u1", Channel::Telegram, Some(MemoryType::Preference))
            .await
            .unwrap();
        assert_eq!(prefs.len(), 1);
        assert_eq!(prefs[0].id, "p");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (store, db, _dir) = setup().await;
        store.insert(&memory("m1", "u1", 5, vec![1.0], "2026-01-01T00:00:00.000Z")).await.unwrap();
        assert!(store.delete("m1").await.unwrap());
        assert!(!store.delete("m1").await.unwrap());
        assert!(!store.delete("never-existed").await.unwrap());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn record_access_bumps_stats() {
        let (store, db, _dir) = setup().await;
        store.insert(&memory("m1", "u1", 5, vec![1.0], "2026-01-01T00:00:00.000Z")).await.unwrap();

        let at = "2026-02-01T00:00:00.000Z";
        let ids = vec!["m1".to_string(), "ghost".to_string()];
        assert_eq!(store.record_access(&ids, at).await.unwrap(), 1);
        assert_eq!(store.record_access(&ids[..1], at).await.unwrap(), 1);

        let m = store.get_by_id("m1").await.unwrap().unwrap();
        assert_eq!(m.access_count, 2);
        assert_eq!(m.last_accessed_at.as_deref(), Some(at));
        assert_eq!(store.record_access(&[], at).await.unwrap(), 0);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn match_is_scoped_thresholded_and_ranked() {
        let (store, db, _dir) = setup().await;
        let ts = "2026-01-01T00:00:00.000Z";
        store.insert(&memory("exact", "u1", 5, vec![1.0, 0.0], ts)).await.unwrap();
        store.insert(&memory("close", "u1", 5, vec![0.9, 0.1], ts)).await.unwrap();
        store.insert(&memory("far", "u1", 5, vec![0.0, 1.0], ts)).await.unwrap();
        store.insert(&memory("foreign", "u2", 5, vec![1.0, 0.0], ts)).await.unwrap();

        let results = store
            .match_memories(MatchQuery {
                embedding: vec![1.0, 0.0],
                user_id: "u1".to_string(),
                channel: Channel::Telegram,
                threshold: 0.7,
                limit: 5,
            })
            .await
            .unwrap();

        let ids: Vec<&str> = results.iter().map(|r| r.memory.id.as_str()).collect();
        assert_eq!(ids, vec!["exact", "close"]);
        assert!(results[0].similarity >= results[1].similarity);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn match_respects_limit() {
        let (store, db, _dir) = setup().await;
        let ts = "2026-01-01T00:00:00.000Z";
        for i in 0..4 {
            store.insert(&memory(&format!("m{i}"), "u1", 5, vec![1.0, 0.0], ts)).await.unwrap();
        }
        let query = MatchQuery {
            embedding: vec![1.0, 0.0],
            user_id: "u1".to_string(),
            channel: Channel::Telegram,
            threshold: 0.5,
            limit: 2,
        };
        assert_eq!(store.match_memories(query.clone()).await.unwrap().len(), 2);
        let none = store.match_memories(MatchQuery { limit: 0, ..query }).await.unwrap();
        assert!(none.is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn delete_decayed_uses_creation_time_when_never_accessed() {
        let (store, db, _dir) = setup().await;
        store.insert(&memory("stale", "u1", 3, vec![1.0], "2026-01-01T00:00:00.000Z")).await.unwrap();
        store.insert(&memory("fresh", "u1", 3, vec![1.0], "2026-03-01T00:00:00.000Z")).await.unwrap();
        store.insert(&memory("keeper", "u1", 5, vec![1.0], "2025-01-01T00:00:00.000Z")).await.unwrap();
        let mut touched = memory("touched", "u1", 2, vec![1.0], "2025-06-01T00:00:00.000Z");
        touched.last_accessed_at = Some("2026-02-20T00:00:00.000Z".to_string());
        store.insert(&touched).await.unwrap();

        let cutoff = "2026-02-01T00:00:00.000Z";
        assert_eq!(store.delete_decayed(5, cutoff).await.unwrap(), 1);
        assert!(store.get_by_id("stale").await.unwrap().is_none());
        assert!(store.get_by_id("fresh").await.unwrap().is_some());
        assert!(store.get_by_id("keeper").await.unwrap().is_some());
        assert!(store.get_by_id("touched").await.unwrap().is_some());
        assert_eq!(store.delete_decayed(5, cutoff).await.unwrap(), 0);
        db.close().await.unwrap();
    }
}
