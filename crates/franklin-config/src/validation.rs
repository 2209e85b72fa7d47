// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as threshold ranges, importance bounds, and non-zero timeouts.

use crate::diagnostic::ConfigError;
use crate::model::FranklinConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &FranklinConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let threshold = config.memory.similarity_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        fail(format!(
            "memory.similarity_threshold must be within 0.0..=1.0, got {threshold}"
        ));
    }

    if config.memory.search_limit == 0 {
        fail("memory.search_limit must be at least 1".to_string());
    }

    if config.memory.max_content_chars == 0 {
        fail("memory.max_content_chars must be at least 1".to_string());
    }

    // Candidates rated 1..=3 are trivia and never stored.
    if !(4..=10).contains(&config.memory.min_importance) {
        fail(format!(
            "memory.min_importance must be within 4..=10, got {}",
            config.memory.min_importance
        ));
    }

    // Memories rated 5 or higher are never decayed.
    if !(1..=5).contains(&config.decay.importance_below) {
        fail(format!(
            "decay.importance_below must be within 1..=5, got {}",
            config.decay.importance_below
        ));
    }

    if config.decay.max_age_days == 0 {
        fail("decay.max_age_days must be at least 1".to_string());
    }

    if config.embedding.dimensions == 0 {
        fail("embedding.dimensions must be at least 1".to_string());
    }

    if config.embedding.batch_size == 0 {
        fail("embedding.batch_size must be at least 1".to_string());
    }

    for (key, secs) in [
        ("embedding.timeout_secs", config.embedding.timeout_secs),
        ("anthropic.timeout_secs", config.anthropic.timeout_secs),
        (
            "memory.extraction_timeout_secs",
            config.memory.extraction_timeout_secs,
        ),
    ] {
        if secs == 0 {
            fail(format!("{key} must be at least 1"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
