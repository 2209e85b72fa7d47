// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory maintenance subcommands.

use std::sync::Arc;

use franklin_anthropic::AnthropicProvider;
use franklin_config::FranklinConfig;
use franklin_core::{Channel, FranklinError};
use franklin_memory::{
    ExtractionReport, Memory, MemorySystem, MemoryType, NewMemory, ScoredMemory, SearchOptions,
};
use franklin_openai::OpenAiEmbedder;
use franklin_storage::{ConversationTurn, Database};

/// Explicitly constructed process state for one command.
pub struct App {
    db: Database,
    system: MemorySystem,
}

impl App {
    /// Open the database and wire the memory subsystem from config.
    pub async fn open(config: &FranklinConfig) -> Result<Self, FranklinError> {
        let db = Database::open_with(&config.storage.database_path, config.storage.wal_mode).await?;
        let embedder = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
        let provider = Arc::new(AnthropicProvider::new(&config.anthropic)?);
        let system = MemorySystem::new(db.clone(), embedder, provider, config);
        Ok(Self { db, system })
    }

    pub async fn close(self) -> Result<(), FranklinError> {
        drop(self.system);
        self.db.close().await
    }

    pub async fn decay(&self) -> Result<(), FranklinError> {
        let removed = self.system.decay.run().await?;
        println!("removed {removed} memories");
        Ok(())
    }

    pub async fn remember(
        &self,
        user_id: &str,
        channel: Channel,
        memory_type: MemoryType,
        importance: u8,
        content: &str,
    ) -> Result<(), FranklinError> {
        let id = self
            .system
            .semantic
            .store(NewMemory {
                user_id: user_id.to_string(),
                channel,
                memory_type,
                content: content.to_string(),
                importance,
            })
            .await?;
        println!("{id}");
        Ok(())
    }

    pub async fn search(
        &self,
        user_id: &str,
        channel: Channel,
        query: &str,
        limit: Option<usize>,
        min_similarity: Option<f32>,
    ) -> Result<(), FranklinError> {
        let hits = self
            .system
            .semantic
            .search(
                user_id,
                channel,
                query,
                SearchOptions {
                    limit,
                    min_similarity,
                },
            )
            .await?;
        print_block(&format_hits(&hits), "no matching memories");
        Ok(())
    }

    pub async fn list(
        &self,
        user_id: &str,
        channel: Channel,
        memory_type: Option<MemoryType>,
    ) -> Result<(), FranklinError> {
        let memories = self
            .system
            .semantic
            .store_handle()
            .list_for_scope(user_id, channel, memory_type)
            .await?;
        print_block(&format_memories(&memories), "no memories");
        Ok(())
    }

    pub async fn forget(&self, id: &str) -> Result<(), FranklinError> {
        if self.system.semantic.delete(id).await? {
            println!("deleted {id}");
        } else {
            println!("no memory with id {id}");
        }
        Ok(())
    }

    pub async fn context(
        &self,
        user_id: &str,
        channel: Channel,
        query: Option<&str>,
    ) -> Result<(), FranklinError> {
        let profile = self.system.profiles.load(user_id, channel).await;
        let context = self.system.assembler.build_context(&profile, query).await;
        print_block(&context, "no context");
        Ok(())
    }

    pub async fn history(
        &self,
        user_id: &str,
        channel: Channel,
        limit: Option<usize>,
    ) -> Result<(), FranklinError> {
        let turns = self.system.history.recent(user_id, channel, limit).await;
        print_block(&format_turns(&turns), "no history");
        Ok(())
    }

    pub async fn extract(
        &self,
        user_id: &str,
        channel: Channel,
        user_message: &str,
        assistant_response: &str,
    ) -> Result<(), FranklinError> {
        let report = self
            .system
            .extractor
            .extract(user_id, channel, user_message, assistant_response)
            .await;
        println!("{}", format_report(&report));
        Ok(())
    }
}

fn print_block(text: &str, empty: &str) {
    if text.is_empty() {
        println!("({empty})");
    } else {
        println!("{text}");
    }
}

pub fn format_memories(memories: &[Memory]) -> String {
    memories
        .iter()
        .map(|m| {
            format!(
                "{}  [{}] importance={} reads={}  {}",
                m.id,
                m.memory_type.label(),
                m.importance,
                m.access_count,
                m.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_hits(hits: &[ScoredMemory]) -> String {
    hits.iter()
        .map(|h| {
            format!(
                "{:.3}  [{}] {}  ({})",
                h.similarity,
                h.memory.memory_type.label(),
                h.memory.content,
                h.memory.id
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_turns(turns: &[ConversationTurn]) -> String {
    turns
        .iter()
        .map(|t| format!("{} {}: {}", t.created_at, t.role, t.content))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_report(report: &ExtractionReport) -> String {
    let mut out = format!(
        "candidates={} stored={} dropped={} failed={}",
        report.candidates,
        report.stored.len(),
        report.dropped,
        report.failed
    );
    for id in &report.stored {
        out.push_str("\n  ");
        out.push_str(id);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use franklin_core::Role;

    fn memory(id: &str) -> Memory {
        Memory {
            id: id.to_string(),
            user_id: "u1".to_string(),
            channel: Channel::Web,
            memory_type: MemoryType::Preference,
            content: "prefers ETFs".to_string(),
            embedding: Vec::new(),
            importance: 7,
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
            last_accessed_at: None,
            access_count: 2,
        }
    }

    #[test]
    fn memory_lines() {
        assert_eq!(
            format_memories(&[memory("m1")]),
            "m1  [PREFERENCE] importance=7 reads=2  prefers ETFs"
        );
        assert_eq!(format_memories(&[]), "");
    }

    #[test]
    fn hit_lines() {
        let hits = [ScoredMemory {
            memory: memory("m1"),
            similarity: 0.8123,
        }];
        assert_eq!(format_hits(&hits), "0.812  [PREFERENCE] prefers ETFs  (m1)");
    }

    #[test]
    fn turn_lines() {
        let turn = ConversationTurn {
            id: "t1".to_string(),
            user_id: "u1".to_string(),
            channel: Channel::Web,
            role: Role::Assistant,
            content: "Hello".to_string(),
            created_at: "2026-01-01T00:00:00.000Z".to_string(),
        };
        assert_eq!(format_turns(&[turn]), "2026-01-01T00:00:00.000Z assistant: Hello");
    }

    #[test]
    fn report_lists_stored_ids() {
        let report = ExtractionReport {
            candidates: 3,
            stored: vec!["a".to_string()],
            dropped: 2,
            failed: 0,
        };
        assert_eq!(
            format_report(&report),
            "candidates=3 stored=1 dropped=2 failed=0\n  a"
        );
    }
}
