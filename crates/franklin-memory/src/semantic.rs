// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic memory service: embed-then-store and embed-then-search.

use std::sync::Arc;

use chrono::Utc;
use franklin_config::model::MemoryConfig;
use franklin_core::types::EmbeddingInput;
use franklin_core::{Channel, EmbeddingAdapter, FranklinError};
use franklin_storage::format_timestamp;
use tracing::{debug, warn};

use crate::store::{MatchQuery, MemoryStore, VectorIndex};
use crate::types::{
    MAX_IMPORTANCE, MIN_IMPORTANCE, Memory, MemoryType, NewMemory, ScoredMemory, truncate_chars,
};

/// Embed a single text.
///
/// Fails with `EmbeddingUnavailable` if the adapter errors or returns no
/// vector; an empty vector is never substituted.
pub async fn embed_text(
    embedder: &dyn EmbeddingAdapter,
    text: &str,
) -> Result<Vec<f32>, FranklinError> {
    let output = embedder
        .embed(EmbeddingInput {
            texts: vec![text.to_string()],
        })
        .await?;
    match output.embeddings.into_iter().next() {
        Some(vector) if !vector.is_empty() => Ok(vector),
        _ => Err(FranklinError::embedding("embedding provider returned no vector")),
    }
}

/// Tunables for [`SemanticMemory`].
#[derive(Debug, Clone)]
pub struct SemanticSettings {
    pub similarity_threshold: f32,
    pub search_limit: usize,
    pub max_content_chars: usize,
}

impl From<&MemoryConfig> for SemanticSettings {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            similarity_threshold: config.similarity_threshold as f32,
            search_limit: config.search_limit,
            max_content_chars: config.max_content_chars,
        }
    }
}

/// Per-call overrides for [`SemanticMemory::search`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchOptions {
    pub limit: Option<usize>,
    pub min_similarity: Option<f32>,
}

/// Stores and retrieves long-term memories by meaning.
#[derive(Clone)]
pub struct SemanticMemory {
    store: MemoryStore,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingAdapter>,
    settings: SemanticSettings,
}

impl SemanticMemory {
    /// Uses `store` as both the row store and the vector index.
    pub fn new(
        store: MemoryStore,
        embedder: Arc<dyn EmbeddingAdapter>,
        settings: SemanticSettings,
    ) -> Self {
        let index: Arc<dyn VectorIndex> = Arc::new(store.clone());
        Self::with_index(store, index, embedder, settings)
    }

    /// Uses a separate vector index for similarity search.
    pub fn with_index(
        store: MemoryStore,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingAdapter>,
        settings: SemanticSettings,
    ) -> Self {
        Self {
            store,
            index,
            embedder,
            settings,
        }
    }

    pub fn store_handle(&self) -> &MemoryStore {
        &self.store
    }

    pub fn settings(&self) -> &SemanticSettings {
        &self.settings
    }

    /// Embed and persist a memory. Returns the new memory's id.
    ///
    /// Content is trimmed and cut to `max_content_chars`. Identical content
    /// stored twice yields two rows.
    pub async fn store(&self, new: NewMemory) -> Result<String, FranklinError> {
        let content = truncate_chars(new.content.trim(), self.settings.max_content_chars).to_string();
        if content.is_empty() {
            return Err(FranklinError::Validation(
                "memory content must not be empty".to_string(),
            ));
        }
        if !(MIN_IMPORTANCE..=MAX_IMPORTANCE).contains(&new.importance) {
            return Err(FranklinError::Validation(format!(
                "importance {} outside {MIN_IMPORTANCE}..={MAX_IMPORTANCE}",
                new.importance
            )));
        }

        let embedding = embed_text(self.embedder.as_ref(), &content).await?;
        let memory = Memory {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            channel: new.channel,
            memory_type: new.memory_type,
            content,
            embedding,
            importance: new.importance,
            created_at: format_timestamp(Utc::now()),
            last_accessed_at: None,
            access_count: 0,
        };
        self.store.insert(&memory).await?;
        debug!(
            memory_id = %memory.id,
            user_id = %memory.user_id,
            channel = %memory.channel,
            memory_type = %memory.memory_type,
            importance = memory.importance,
            "memory stored"
        );
        Ok(memory.id)
    }

    /// Memories in the scope similar to `query`, most similar first.
    ///
    /// Embedding failures propagate. Index failures degrade to an empty
    /// result. Returned rows carry their access stats as read, before this
    /// search's bump is applied.
    pub async fn search(
        &self,
        user_id: &str,
        channel: Channel,
        query: &str,
        options: SearchOptions,
    ) -> Result<Vec<ScoredMemory>, FranklinError> {
        let limit = options.limit.unwrap_or(self.settings.search_limit);
        let threshold = options
            .min_similarity
            .unwrap_or(self.settings.similarity_threshold);
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let embedding = embed_text(self.embedder.as_ref(), query).await?;
        let results = match self
            .index
            .match_memories(MatchQuery {
                embedding,
                user_id: user_id.to_string(),
                channel,
                threshold,
                limit,
            })
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(user_id, %channel, error = %e, "memory search failed, returning no memories");
                return Ok(Vec::new());
            }
        };

        if !results.is_empty() {
            let ids: Vec<String> = results.iter().map(|r| r.memory.id.clone()).collect();
            let now = format_timestamp(Utc::now());
            if let Err(e) = self.store.record_access(&ids, &now).await {
                warn!(user_id, %channel, error = %e, "failed to record memory access");
            }
        }
        debug!(user_id, %channel, count = results.len(), "memory search complete");
        Ok(results)
    }

    /// Every memory in the scope, most important first. Fails open.
    pub async fn list_all(
        &self,
        user_id: &str,
        channel: Channel,
        memory_type: Option<MemoryType>,
    ) -> Vec<Memory> {
        match self.store.list_for_scope(user_id, channel, memory_type).await {
            Ok(memories) => memories,
            Err(e) => {
                warn!(user_id, %channel, error = %e, "failed to list memories");
                Vec::new()
            }
        }
    }

    /// Hard delete. Deleting an unknown id returns `false`.
    pub async fn delete(&self, memory_id: &str) -> Result<bool, FranklinError> {
        let removed = self.store.delete(memory_id).await?;
        debug!(memory_id, removed, "memory delete");
        Ok(removed)
    }
}
