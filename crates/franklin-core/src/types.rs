// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Franklin memory system.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Messaging surface a conversation arrives on.
///
/// Together with a channel-specific user identifier this forms the scoping
/// key for history, profiles, and memories. A user's data on one channel is
/// never mixed with another channel.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Website chat widget.
    Web,
    Telegram,
    Whatsapp,
    /// Voice calls.
    Voice,
    Email,
    Twitter,
}

impl Channel {
    /// Column value used in every scoped table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Web => "web",
            Channel::Telegram => "telegram",
            Channel::Whatsapp => "whatsapp",
            Channel::Voice => "voice",
            Channel::Email => "email",
            Channel::Twitter => "twitter",
        }
    }
}

/// Author of a conversation turn.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Column value in `conversation_turns.role`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// Result of [`PluginAdapter::health_check`](crate::PluginAdapter::health_check).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Ready to serve calls.
    Healthy,
    /// Usable configuration is missing or partial; calls may fail.
    Degraded(String),
    /// Calls will fail.
    Unhealthy(String),
}

/// Identifies the type of adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    Embedding,
}

// --- Embedding types ---

/// Texts to embed in one call.
#[derive(Debug, Clone)]
pub struct EmbeddingInput {
    /// Texts to embed, in order.
    pub texts: Vec<String>,
}

/// Vectors for an [`EmbeddingInput`].
#[derive(Debug, Clone)]
pub struct EmbeddingOutput {
    /// One vector per input text, in input order.
    pub embeddings: Vec<Vec<f32>>,
    /// Dimensionality of every returned vector.
    pub dimensions: usize,
}

// --- Provider types ---

/// A single text message sent to an LLM provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// "user" or "assistant".
    pub role: String,
    pub content: String,
}

/// Single-shot completion request.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    /// Model identifier.
    pub model: String,
    /// Optional system prompt.
    pub system_prompt: Option<String>,
    /// Messages in dialogue order.
    pub messages: Vec<ProviderMessage>,
    /// Output token cap.
    pub max_tokens: u32,
    /// Sampling temperature. `None` uses the provider default.
    pub temperature: Option<f32>,
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Completion result with text blocks joined.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    /// Provider-assigned response identifier.
    pub id: String,
    /// Concatenated text content of the response.
    pub content: String,
    /// Model that produced the response.
    pub model: String,
    /// Why generation stopped, if reported.
    pub stop_reason: Option<String>,
    pub usage: TokenUsage,
}
