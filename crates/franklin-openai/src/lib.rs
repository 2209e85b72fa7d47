// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible embedding adapter for the Franklin memory system.
//!
//! [`OpenAiEmbedder`] implements [`EmbeddingAdapter`] over `POST /embeddings`.
//! It never substitutes a placeholder vector: if the provider cannot produce a
//! real embedding the call fails with `EmbeddingUnavailable`.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use franklin_config::model::EmbeddingConfig;
use franklin_core::error::FranklinError;
use franklin_core::traits::{EmbeddingAdapter, PluginAdapter};
use franklin_core::types::{AdapterType, EmbeddingInput, EmbeddingOutput, HealthStatus};
use tracing::{debug, info, warn};

use crate::client::OpenAiClient;

/// Pause between consecutive batches of one large `embed` call.
const BATCH_DELAY: Duration = Duration::from_millis(100);

/// Embedding adapter backed by an OpenAI-compatible HTTP API.
///
/// API key resolution order: config -> `OPENAI_API_KEY` env var. Without a key
/// the adapter still constructs, reports `Degraded`, and fails every `embed`.
pub struct OpenAiEmbedder {
    client: Option<OpenAiClient>,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl OpenAiEmbedder {
    /// Creates the embedder from the `[embedding]` config section.
    pub fn new(config: &EmbeddingConfig) -> Result<Self, FranklinError> {
        let client = match resolve_api_key(&config.api_key) {
            Some(key) => Some(OpenAiClient::new(
                &key,
                &config.base_url,
                Duration::from_secs(config.timeout_secs),
                config.max_retries,
            )?),
            None => {
                warn!("no embedding API key configured; semantic memory is unavailable");
                None
            }
        };

        info!(
            model = config.model,
            dimensions = config.dimensions,
            "embedding adapter initialized"
        );

        Ok(Self {
            client,
            model: config.model.clone(),
            dimensions: config.dimensions,
            batch_size: config.batch_size.max(1),
        })
    }

    /// Vector length this embedder produces.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn client(&self) -> Result<&OpenAiClient, FranklinError> {
        self.client
            .as_ref()
            .ok_or_else(|| FranklinError::embedding("no embedding API key configured"))
    }
}

#[async_trait]
impl PluginAdapter for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai-embeddings"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, FranklinError> {
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Degraded("no embedding API key configured".into()),
        })
    }
}

#[async_trait]
impl EmbeddingAdapter for OpenAiEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, FranklinError> {
        let client = self.client()?;
        if input.texts.iter().any(|t| t.trim().is_empty()) {
            return Err(FranklinError::embedding("cannot embed empty text"));
        }

        let mut embeddings = Vec::with_capacity(input.texts.len());
        for (i, batch) in input.texts.chunks(self.batch_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(BATCH_DELAY).await;
            }
            let vectors = client
                .embed_batch(&self.model, batch, Some(self.dimensions))
                .await?;
            embeddings.extend(vectors);
        }

        if let Some(bad) = embeddings.iter().find(|v| v.len() != self.dimensions) {
            return Err(FranklinError::embedding(format!(
                "provider returned {} dimensions, expected {}",
                bad.len(),
                self.dimensions
            )));
        }

        debug!(count = embeddings.len(), "texts embedded");
        Ok(EmbeddingOutput {
            embeddings,
            dimensions: self.dimensions,
        })
    }
}

fn resolve_api_key(config_key: &Option<String>) -> Option<String> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Some(key.clone());
    }
    std::env::var("OPENAI_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
}
