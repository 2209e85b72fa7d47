// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Franklin memory system.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level Franklin configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FranklinConfig {
    /// Agent identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Embedding provider settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Anthropic API settings (used for memory extraction).
    #[serde(default)]
    pub anthropic: AnthropicConfig,

    /// Memory store, search, and extraction settings.
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Memory decay sweep settings.
    #[serde(default)]
    pub decay: DecayConfig,

    /// Conversation history settings.
    #[serde(default)]
    pub history: HistoryConfig,

    /// User profile settings.
    #[serde(default)]
    pub profile: ProfileConfig,
}

/// Agent identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name used when rendering assistant turns (e.g. `Franklin: ...`).
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "franklin".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("franklin").join("franklin.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("franklin.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Embedding provider configuration (OpenAI-compatible `/embeddings` endpoint).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbeddingConfig {
    /// API key. Falls back to `OPENAI_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL of the API, without the `/embeddings` suffix.
    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    /// Embedding model name.
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Requested vector dimensionality. Must match what is already stored.
    #[serde(default = "default_embedding_dimensions")]
    pub dimensions: usize,

    /// Per-request timeout in seconds.
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient HTTP failures (429/5xx).
    #[serde(default)]
    pub max_retries: u32,

    /// Maximum number of texts per request.
    #[serde(default = "default_embedding_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimensions: default_embedding_dimensions(),
            timeout_secs: default_embedding_timeout_secs(),
            max_retries: 0,
            batch_size: default_embedding_batch_size(),
        }
    }
}

fn default_embedding_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_embedding_dimensions() -> usize {
    1536
}

fn default_embedding_timeout_secs() -> u64 {
    5
}

fn default_embedding_batch_size() -> usize {
    100
}

/// Anthropic API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AnthropicConfig {
    /// API key. Falls back to `ANTHROPIC_API_KEY` when unset.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Anthropic API version string.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_anthropic_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries on transient HTTP failures (429/500/503/529).
    #[serde(default = "default_anthropic_max_retries")]
    pub max_retries: u32,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_version: default_api_version(),
            timeout_secs: default_anthropic_timeout_secs(),
            max_retries: default_anthropic_max_retries(),
        }
    }
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_anthropic_timeout_secs() -> u64 {
    10
}

fn default_anthropic_max_retries() -> u32 {
    1
}

/// Memory system configuration.
///
/// Controls long-term memory storage, retrieval, and extraction.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Enable the memory system. When false, context carries no memories
    /// and no extraction is dispatched.
    #[serde(default = "default_memory_enabled")]
    pub enabled: bool,

    /// Minimum cosine similarity for a memory to be returned (0.0-1.0).
    /// Anything below is treated as noise.
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Default number of memories returned by a search.
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,

    /// Stored memory content is truncated to this many characters.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,

    /// Model used for memory extraction.
    #[serde(default = "default_extraction_model")]
    pub extraction_model: String,

    /// Token budget for the extraction response.
    #[serde(default = "default_extraction_max_tokens")]
    pub extraction_max_tokens: u32,

    /// Extracted candidates below this importance are dropped. At least 4.
    #[serde(default = "default_min_importance")]
    pub min_importance: u8,

    /// Upper bound on the extraction LLM call, in seconds.
    #[serde(default = "default_extraction_timeout_secs")]
    pub extraction_timeout_secs: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: default_memory_enabled(),
            similarity_threshold: default_similarity_threshold(),
            search_limit: default_search_limit(),
            max_content_chars: default_max_content_chars(),
            extraction_model: default_extraction_model(),
            extraction_max_tokens: default_extraction_max_tokens(),
            min_importance: default_min_importance(),
            extraction_timeout_secs: default_extraction_timeout_secs(),
        }
    }
}

fn default_memory_enabled() -> bool {
    true
}

fn default_similarity_threshold() -> f64 {
    0.7
}

fn default_search_limit() -> usize {
    5
}

fn default_max_content_chars() -> usize {
    100
}

fn default_extraction_model() -> String {
    "claude-3-5-haiku-20241022".to_string()
}

fn default_extraction_max_tokens() -> u32 {
    1024
}

fn default_min_importance() -> u8 {
    4
}

fn default_extraction_timeout_secs() -> u64 {
    10
}

/// Memory decay configuration.
///
/// A memory is removed when its importance is below `importance_below` and it
/// has not been accessed (or, if never accessed, created) within `max_age_days`.
/// `importance_below` is capped at 5.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DecayConfig {
    #[serde(default = "default_importance_below")]
    pub importance_below: u8,

    #[serde(default = "default_max_age_days")]
    pub max_age_days: u32,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            importance_below: default_importance_below(),
            max_age_days: default_max_age_days(),
        }
    }
}

fn default_importance_below() -> u8 {
    5
}

fn default_max_age_days() -> u32 {
    30
}

/// Conversation history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HistoryConfig {
    /// Number of turns returned by `recent` when no limit is given.
    #[serde(default = "default_history_limit")]
    pub default_limit: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            default_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    20
}

/// User profile configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Internal notes kept per profile; older notes are discarded.
    #[serde(default = "default_max_internal_notes")]
    pub max_internal_notes: usize,

    /// Newest internal notes rendered into the context block.
    #[serde(default = "default_context_notes")]
    pub context_notes: usize,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            max_internal_notes: default_max_internal_notes(),
            context_notes: default_context_notes(),
        }
    }
}

fn default_max_internal_notes() -> usize {
    50
}

fn default_context_notes() -> usize {
    5
}
