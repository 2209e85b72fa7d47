// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-crate fakes for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use franklin_core::types::{
    EmbeddingInput, EmbeddingOutput, ProviderRequest, ProviderResponse, TokenUsage,
};
use franklin_core::{
    AdapterType, EmbeddingAdapter, FranklinError, HealthStatus, PluginAdapter, ProviderAdapter,
};
use franklin_storage::Database;

pub async fn setup_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("test.db");
    let db = Database::open(path.to_str().unwrap()).await.unwrap();
    (db, dir)
}

const DIMS: usize = 32;

/// Topic stems; each group owns one dimension.
const TOPICS: &[&[&str]] = &[
    &["invest", "trad", "day", "stock", "bond", "market", "etf"],
    &["dog", "cat", "pet"],
    &["coffee", "tea", "food"],
    &["sav", "house", "retire", "mortgage"],
];

/// Bag-of-topics embedder: words matching a topic stem weigh 1.0 on that
/// topic's dimension, other words weigh 0.1 on a hashed dimension.
#[derive(Default)]
pub struct KeywordEmbedder {
    fail: bool,
}

impl KeywordEmbedder {
    pub fn failing() -> Self {
        Self { fail: true }
    }

    pub fn vector(text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; DIMS];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            match TOPICS
                .iter()
                .position(|stems| stems.iter().any(|s| word.starts_with(s)))
            {
                Some(topic) => v[topic] += 1.0,
                None => {
                    let hash = word.bytes().fold(0u32, |h, b| h.wrapping_mul(31).wrapping_add(b as u32));
                    v[TOPICS.len() + hash as usize % (DIMS - TOPICS.len())] += 0.1;
                }
            }
        }
        v
    }
}

#[async_trait]
impl PluginAdapter for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }
    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }
    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }
    async fn health_check(&self) -> Result<HealthStatus, FranklinError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for KeywordEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, FranklinError> {
        if self.fail {
            return Err(FranklinError::embedding("keyword embedder offline"));
        }
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| Self::vector(t)).collect(),
            dimensions: DIMS,
        })
    }
}

/// Provider that replays queued outcomes and records requests.
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<String, String>>>,
    pub requests: Mutex<Vec<ProviderRequest>>,
    delay: Option<std::time::Duration>,
}

impl ScriptedProvider {
    pub fn replying(text: &str) -> Self {
        let provider = Self::default();
        provider.replies.lock().unwrap().push_back(Ok(text.to_string()));
        provider
    }

    pub fn failing(message: &str) -> Self {
        let provider = Self::default();
        provider.replies.lock().unwrap().push_back(Err(message.to_string()));
        provider
    }

    pub fn slow(text: &str, delay: std::time::Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::replying(text)
        }
    }
}

#[async_trait]
impl PluginAdapter for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }
    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }
    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }
    async fn health_check(&self) -> Result<HealthStatus, FranklinError> {
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl ProviderAdapter for ScriptedProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, FranklinError> {
        let model = request.model.clone();
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        match next {
            Some(Ok(content)) => Ok(ProviderResponse {
                id: "msg_test".to_string(),
                content,
                model,
                stop_reason: Some("end_turn".to_string()),
                usage: TokenUsage::default(),
            }),
            Some(Err(message)) => Err(FranklinError::Provider {
                message,
                source: None,
            }),
            None => Ok(ProviderResponse {
                id: "msg_test".to_string(),
                content: "[]".to_string(),
                model,
                stop_reason: Some("end_turn".to_string()),
                usage: TokenUsage::default(),
            }),
        }
    }
}
