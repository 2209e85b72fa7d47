// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Anthropic Claude provider adapter for the Franklin memory system.
//!
//! Implements [`ProviderAdapter`] over the Anthropic Messages API. The memory
//! extractor is its only consumer, so only single-shot completion is offered.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;
use franklin_config::model::AnthropicConfig;
use franklin_core::error::FranklinError;
use franklin_core::traits::{PluginAdapter, ProviderAdapter};
use franklin_core::types::{
    AdapterType, HealthStatus, ProviderRequest, ProviderResponse, TokenUsage,
};
use tracing::{info, warn};

use crate::client::AnthropicClient;
use crate::types::{ApiMessage, MessageRequest};

/// Anthropic Claude provider implementing [`ProviderAdapter`].
///
/// API key resolution order: config -> `ANTHROPIC_API_KEY` env var. Without a
/// key the provider still constructs, reports `Degraded`, and fails every
/// completion, so extraction degrades to a logged no-op.
pub struct AnthropicProvider {
    client: Option<AnthropicClient>,
}

impl AnthropicProvider {
    /// Creates a new Anthropic provider from the `[anthropic]` config section.
    pub fn new(config: &AnthropicConfig) -> Result<Self, FranklinError> {
        let client = match resolve_api_key(&config.api_key) {
            Some(api_key) => Some(AnthropicClient::new(
                &api_key,
                &config.api_version,
                Duration::from_secs(config.timeout_secs),
                config.max_retries,
            )?),
            None => {
                warn!("no Anthropic API key configured; memory extraction is unavailable");
                None
            }
        };

        info!(
            api_version = config.api_version,
            timeout_secs = config.timeout_secs,
            "Anthropic provider initialized"
        );

        Ok(Self { client })
    }

    /// Creates a provider with an existing client (for testing).
    #[cfg(test)]
    fn with_client(client: AnthropicClient) -> Self {
        Self {
            client: Some(client),
        }
    }

    fn client(&self) -> Result<&AnthropicClient, FranklinError> {
        self.client.as_ref().ok_or_else(|| FranklinError::Provider {
            message: "no Anthropic API key configured".to_string(),
            source: None,
        })
    }
}

/// Converts a [`ProviderRequest`] to an Anthropic [`MessageRequest`].
fn to_message_request(request: &ProviderRequest) -> MessageRequest {
    MessageRequest {
        model: request.model.clone(),
        messages: request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.clone(),
                content: m.content.clone(),
            })
            .collect(),
        system: request.system_prompt.clone(),
        max_tokens: request.max_tokens,
        temperature: request.temperature,
    }
}

#[async_trait]
impl PluginAdapter for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, FranklinError> {
        // A live probe would spend tokens; key presence is the signal.
        Ok(match self.client {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Degraded("no Anthropic API key configured".into()),
        })
    }
}

#[async_trait]
impl ProviderAdapter for AnthropicProvider {
    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, FranklinError> {
        let api_request = to_message_request(&request);
        let response = self.client()?.complete_message(&api_request).await?;
        let content = response.text();

        Ok(ProviderResponse {
            id: response.id,
            content,
            model: response.model,
            stop_reason: response.stop_reason,
            usage: TokenUsage {
                input_tokens: response.usage.input_tokens,
                output_tokens: response.usage.output_tokens,
            },
        })
    }
}

/// Resolves the API key from config, falling back to `ANTHROPIC_API_KEY`.
fn resolve_api_key(config_key: &Option<String>) -> Option<String> {
    if let Some(key) = config_key
        && !key.is_empty()
    {
        return Some(key.clone());
    }

    std::env::var("ANTHROPIC_API_KEY")
        .ok()
        .filter(|key| !key.is_empty())
}
