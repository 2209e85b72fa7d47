// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Franklin memory system.

use thiserror::Error;

/// The primary error type used across all Franklin adapter traits and core operations.
#[derive(Debug, Error)]
pub enum FranklinError {
    /// Configuration could not be loaded or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Caller input violates a domain constraint (empty content, importance out of range).
    #[error("invalid input: {0}")]
    Validation(String),

    /// The datastore rejected a read or write.
    #[error("persistence error: {source}")]
    Persistence {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The embedding provider could not be reached or rejected the request.
    #[error("embedding unavailable: {message}")]
    EmbeddingUnavailable {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Language model output could not be parsed into memory candidates.
    #[error("extraction output could not be parsed: {0}")]
    ExtractionParse(String),

    /// The language model call failed or returned an error body.
    #[error("provider error: {message}")]
    Provider {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Invariant broken inside Franklin itself.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FranklinError {
    /// Shorthand for an `EmbeddingUnavailable` error without an underlying source.
    pub fn embedding(message: impl Into<String>) -> Self {
        FranklinError::EmbeddingUnavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error came from the embedding provider.
    pub fn is_embedding_unavailable(&self) -> bool {
        matches!(self, FranklinError::EmbeddingUnavailable { .. })
    }
}
