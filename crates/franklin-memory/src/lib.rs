// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory and context subsystem for Franklin.
//!
//! Keeps a rolling conversation history and a user profile per
//! (user, channel), extracts long-term memories from exchanges, retrieves
//! them by meaning, and assembles the context text injected into prompts.
//!
//! ## Architecture
//!
//! - **MemoryStore**: SQLite persistence with BLOB vectors; implements [`VectorIndex`]
//! - **SemanticMemory**: embed-then-store and embed-then-search
//! - **MemoryExtractor**: LLM-based extraction, dispatched in the background
//! - **ConversationHistory**: append-only transcript, read oldest first
//! - **ProfileStore**: name, preferences, coarse facts, internal notes
//! - **ContextAssembler**: renders profile and relevant memories
//! - **MemoryDecay**: deletes stale low-importance memories
//! - **MemorySystem**: all of the above wired from one config

pub mod context;
pub mod decay;
pub mod extractor;
pub mod history;
pub mod profile;
pub mod semantic;
pub mod store;
pub mod types;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use franklin_config::FranklinConfig;
use franklin_core::{Channel, EmbeddingAdapter, ProviderAdapter, Role};
use franklin_storage::{ConversationTurn, Database, UserProfile};
use tokio::task::JoinHandle;
use tracing::debug;

pub use context::ContextAssembler;
pub use decay::MemoryDecay;
pub use extractor::{ExtractorSettings, MemoryExtractor};
pub use history::ConversationHistory;
pub use profile::ProfileStore;
pub use semantic::{SearchOptions, SemanticMemory, SemanticSettings, embed_text};
pub use store::{MatchQuery, MemoryStore, VectorIndex};
pub use types::*;

/// Everything a conversation turn needs from the memory layer.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub profile: UserProfile,
    /// Rendered profile and memories; may be empty.
    pub context: String,
    /// Recent turns, oldest first.
    pub history: Vec<ConversationTurn>,
}

/// The memory subsystem, constructed once by the process entry point.
#[derive(Clone)]
pub struct MemorySystem {
    pub semantic: SemanticMemory,
    pub extractor: Arc<MemoryExtractor>,
    pub history: ConversationHistory,
    pub profiles: ProfileStore,
    pub assembler: ContextAssembler,
    pub decay: MemoryDecay,
    extraction_enabled: bool,
}

impl MemorySystem {
    pub fn new(
        db: Database,
        embedder: Arc<dyn EmbeddingAdapter>,
        provider: Arc<dyn ProviderAdapter>,
        config: &FranklinConfig,
    ) -> Self {
        let store = MemoryStore::new(db.connection().clone());
        let semantic = SemanticMemory::new(
            store.clone(),
            embedder,
            SemanticSettings::from(&config.memory),
        );
        let extractor = Arc::new(MemoryExtractor::new(
            semantic.clone(),
            provider,
            ExtractorSettings::from(&config.memory),
        ));
        Self {
            assembler: ContextAssembler::new(
                semantic.clone(),
                config.profile.context_notes,
                config.memory.enabled,
            ),
            decay: MemoryDecay::new(store, &config.decay),
            history: ConversationHistory::new(db.clone(), config.history.default_limit),
            profiles: ProfileStore::new(db, config.profile.max_internal_notes),
            semantic,
            extractor,
            extraction_enabled: config.memory.enabled,
        }
    }

    /// Load the profile, render context for `query`, and fetch recent history.
    ///
    /// Never fails; degraded storage or embeddings yield less context.
    pub async fn context_for(&self, user_id: &str, channel: Channel, query: &str) -> TurnContext {
        let profile = self.profiles.load(user_id, channel).await;
        let (context, history) = tokio::join!(
            self.assembler.build_context(&profile, Some(query)),
            self.history.recent(user_id, channel, None),
        );
        TurnContext {
            profile,
            context,
            history,
        }
    }

    /// Record a completed exchange and start background extraction.
    ///
    /// Returns the extraction handle when extraction is enabled. Dropping it
    /// does not cancel the task.
    pub async fn record_exchange(
        &self,
        user_id: &str,
        channel: Channel,
        user_message: &str,
        assistant_response: &str,
    ) -> Option<JoinHandle<ExtractionReport>> {
        self.history
            .append(user_id, channel, Role::User, user_message)
            .await;
        self.history
            .append(user_id, channel, Role::Assistant, assistant_response)
            .await;

        if !self.extraction_enabled {
            debug!(user_id, %channel, "memory disabled, skipping extraction");
            return None;
        }
        Some(self.extractor.dispatch(
            user_id.to_string(),
            channel,
            user_message.to_string(),
            assistant_response.to_string(),
        ))
    }
}
