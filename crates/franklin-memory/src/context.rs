// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Context assembly: profile and relevant memories rendered as prompt text.
//!
//! History is not rendered here; callers pass it to the prompt separately.

use franklin_storage::UserProfile;
use tracing::{debug, warn};

use crate::semantic::{SearchOptions, SemanticMemory};
use crate::types::ScoredMemory;

/// Builds the context block prepended to the system prompt.
#[derive(Clone)]
pub struct ContextAssembler {
    semantic: SemanticMemory,
    /// How many of the newest internal notes to show.
    context_notes: usize,
    /// When false, the memories section is never produced.
    memory_enabled: bool,
}

impl ContextAssembler {
    pub fn new(semantic: SemanticMemory, context_notes: usize, memory_enabled: bool) -> Self {
        Self {
            semantic,
            context_notes,
            memory_enabled,
        }
    }

    /// Render the profile plus, when `current_query` is given, the memories
    /// relevant to it.
    ///
    /// Empty sections are omitted; a profile with nothing known and no
    /// memory hits renders as an empty string. Search failures drop the
    /// memories section.
    ///
    /// Nothing in the profile is changed, but the memory search records an
    /// access on every hit it returns, so surfaced memories get a fresh
    /// `last_accessed_at` and a higher `access_count`.
    pub async fn build_context(&self, profile: &UserProfile, current_query: Option<&str>) -> String {
        let memories = match current_query {
            Some(query) if self.memory_enabled && !query.trim().is_empty() => {
                match self
                    .semantic
                    .search(&profile.user_id, profile.channel, query, SearchOptions::default())
                    .await
                {
                    Ok(hits) => hits,
                    Err(e) => {
                        warn!(
                            user_id = %profile.user_id,
                            channel = %profile.channel,
                            error = %e,
                            "memory search failed, building context without memories"
                        );
                        Vec::new()
                    }
                }
            }
            _ => Vec::new(),
        };

        let context = render_context(profile, &memories, self.context_notes);
        debug!(
            user_id = %profile.user_id,
            channel = %profile.channel,
            memories = memories.len(),
            chars = context.len(),
            "context assembled"
        );
        context
    }
}

/// Render sections in fixed order, separated by blank lines.
pub fn render_context(profile: &UserProfile, memories: &[ScoredMemory], context_notes: usize) -> String {
    let mut sections = Vec::new();

    if !profile.facts.is_empty() {
        sections.push(section("KNOWN FACTS", profile.facts.iter().cloned()));
    }
    if !profile.preferences.is_empty() {
        sections.push(section(
            "PREFERENCES",
            profile.preferences.iter().map(|(k, v)| format!("{k}: {v}")),
        ));
    }
    let skip = profile.internal_notes.len().saturating_sub(context_notes);
    let notes = &profile.internal_notes[skip..];
    if !notes.is_empty() {
        sections.push(section("INTERNAL NOTES", notes.iter().cloned()));
    }
    if !memories.is_empty() {
        sections.push(section(
            "RELEVANT MEMORIES",
            memories
                .iter()
                .map(|m| format!("[{}] {}", m.memory.memory_type.label(), m.memory.content)),
        ));
    }

    sections.join("\n\n")
}

fn section(header: &str, lines: impl Iterator<Item = String>) -> String {
    let mut out = format!("{header}:");
    for line in lines {
        out.push_str("\n- ");
        out.push_str(&line);
    }
    out
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::semantic::SemanticSettings;
    use crate::store::MemoryStore;
    use crate::test_support::{KeywordEmbedder, setup_db};
    use crate::types::{MemoryType, NewMemory};
    use franklin_core::Channel;

    fn empty_profile() -> UserProfile {
        UserProfile::new("u1", Channel::Telegram, "2026-01-01T00:00:00.000Z")
    }

    fn semantic(db: &franklin_storage::Database, embedder: KeywordEmbedder) -> SemanticMemory {
        SemanticMemory::new(
            MemoryStore::new(db.connection().clone()),
            Arc::new(embedder),
            SemanticSettings {
                similarity_threshold: 0.7,
                search_limit: 5,
                max_content_chars: 100,
            },
        )
    }

    #[test]
    fn empty_profile_renders_nothing() {
        assert_eq!(render_context(&empty_profile(), &[], 5), "");
    }

    #[test]
    fn sections_render_in_order() {
        let mut profile = empty_profile();
        profile.facts = vec!["lives in Austin".to_string()];
        profile.preferences.insert("risk".to_string(), "low".to_string());
        profile.preferences.insert("horizon".to_string(), "10 years".to_string());
        profile.internal_notes = (1..=7).map(|i| format!("[t{i}] note {i}")).collect();

        let rendered = render_context(&profile, &[], 2);
        assert_eq!(
            rendered,
            "KNOWN FACTS:\n- lives in Austin\n\n\
             PREFERENCES:\n- horizon: 10 years\n- risk: low\n\n\
             INTERNAL NOTES:\n- [t6] note 6\n- [t7] note 7"
        );
    }

    #[test]
    fn zero_context_notes_hides_notes() {
        let mut profile = empty_profile();
        profile.internal_notes = vec!["[t] note".to_string()];
        assert_eq!(render_context(&profile, &[], 0), "");
    }

    #[tokio::test]
    async fn relevant_memories_follow_profile_sections() {
        let (db, _dir) = setup_db().await;
        let semantic = semantic(&db, KeywordEmbedder::default());
        semantic
            .store(NewMemory {
                user_id: "u1".to_string(),
                channel: Channel::Telegram,
                memory_type: MemoryType::Preference,
                content: "prefers long-term investing over day-trading".to_string(),
                importance: 7,
            })
            .await
            .unwrap();
        let assembler = ContextAssembler::new(semantic, 5, true);

        let mut profile = empty_profile();
        profile.facts = vec!["has two kids".to_string()];
        let context = assembler
            .build_context(&profile, Some("should I day trade?"))
            .await;
        assert_eq!(
            context,
            "KNOWN FACTS:\n- has two kids\n\n\
             RELEVANT MEMORIES:\n- [PREFERENCE] prefers long-term investing over day-trading"
        );

        let without_query = assembler.build_context(&profile, None).await;
        assert_eq!(without_query, "KNOWN FACTS:\n- has two kids");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn surfaced_memories_are_marked_accessed() {
        let (db, _dir) = setup_db().await;
        let semantic = semantic(&db, KeywordEmbedder::default());
        let id = semantic
            .store(NewMemory {
                user_id: "u1".to_string(),
                channel: Channel::Telegram,
                memory_type: MemoryType::Preference,
                content: "prefers long-term investing over day-trading".to_string(),
                importance: 7,
            })
            .await
            .unwrap();
        let store = MemoryStore::new(db.connection().clone());
        let assembler = ContextAssembler::new(semantic, 5, true);

        let mut profile = empty_profile();
        profile.facts = vec!["has two kids".to_string()];
        let before = profile.clone();
        assembler
            .build_context(&profile, Some("should I day trade?"))
            .await;
        assembler
            .build_context(&profile, Some("should I day trade?"))
            .await;

        let memory = store.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(memory.access_count, 2);
        assert!(memory.last_accessed_at.is_some());
        assert_eq!(profile, before);
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn no_hits_and_failures_omit_memories() {
        let (db, _dir) = setup_db().await;
        let assembler = ContextAssembler::new(semantic(&db, KeywordEmbedder::default()), 5, true);
        assert_eq!(assembler.build_context(&empty_profile(), Some("anything")).await, "");

        let broken = ContextAssembler::new(semantic(&db, KeywordEmbedder::failing()), 5, true);
        assert_eq!(broken.build_context(&empty_profile(), Some("anything")).await, "");
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn disabled_memory_skips_search() {
        let (db, _dir) = setup_db().await;
        let semantic = semantic(&db, KeywordEmbedder::default());
        semantic
            .store(NewMemory {
                user_id: "u1".to_string(),
                channel: Channel::Telegram,
                memory_type: MemoryType::Fact,
                content: "holds index funds".to_string(),
                importance: 6,
            })
            .await
            .unwrap();
        let assembler = ContextAssembler::new(semantic, 5, false);
        assert_eq!(assembler.build_context(&empty_profile(), Some("index funds")).await, "");
        db.close().await.unwrap();
    }
}
