// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic embedding adapter for tests.
//!
//! Texts are tokenized on non-alphanumeric boundaries. Tokens that start
//! with a registered concept stem collapse onto that concept and weigh
//! fully; all other tokens weigh a quarter. Each token is FNV-1a hashed
//! into a signed bucket and the result is unit-normalized, so texts sharing
//! concepts score high cosine similarity and unrelated texts score near zero.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use franklin_core::types::{EmbeddingInput, EmbeddingOutput};
use franklin_core::{AdapterType, EmbeddingAdapter, FranklinError, HealthStatus, PluginAdapter};

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
const CONCEPT_WEIGHT: f32 = 1.0;
const TOKEN_WEIGHT: f32 = 0.25;

fn fnv1a_hash(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Mock embedder with optional fixed vectors and a failure switch.
pub struct MockEmbedder {
    dimensions: usize,
    concepts: Vec<(String, Vec<String>)>,
    fixed: HashMap<String, Vec<f32>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
            concepts: Vec::new(),
            fixed: HashMap::new(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// A 256-dimension embedder that knows a few personal-finance concepts.
    pub fn finance() -> Self {
        Self::new(256)
            .with_concept(
                "trading",
                &["invest", "trad", "day", "stock", "etf", "market", "portfolio", "bond", "fund"],
            )
            .with_concept("retirement", &["retire", "pension", "401k", "ira"])
            .with_concept("family", &["kid", "child", "wife", "husband", "daughter", "son"])
            .with_concept("housing", &["house", "home", "mortgage", "rent"])
            .with_concept("crypto", &["crypto", "bitcoin", "btc", "eth"])
    }

    /// Map every token starting with one of `stems` onto `name`.
    pub fn with_concept(mut self, name: &str, stems: &[&str]) -> Self {
        self.concepts.push((
            name.to_string(),
            stems.iter().map(|s| s.to_ascii_lowercase()).collect(),
        ));
        self
    }

    /// Return `vector` verbatim whenever `text` is embedded.
    pub fn with_vector(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.fixed.insert(text.to_string(), vector);
        self
    }

    /// Make subsequent calls fail with `EmbeddingUnavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(fixed) = self.fixed.get(text) {
            return fixed.clone();
        }
        let mut vector = vec![0.0f32; self.dimensions];
        for raw in text.split(|c: char| !c.is_alphanumeric()) {
            if raw.is_empty() {
                continue;
            }
            let token = raw.to_lowercase();
            let (key, weight) = match self
                .concepts
                .iter()
                .find(|(_, stems)| stems.iter().any(|stem| token.starts_with(stem.as_str())))
            {
                Some((name, _)) => (format!("concept:{name}"), CONCEPT_WEIGHT),
                None => (token, TOKEN_WEIGHT),
            };
            let hash = fnv1a_hash(key.as_bytes());
            let index = (hash as usize) % self.dimensions;
            let sign = if hash & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign * weight;
        }
        let magnitude = vector.iter().map(|c| c * c).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for component in &mut vector {
                *component /= magnitude;
            }
        } else {
            // Text with no tokens still needs a usable direction.
            vector[0] = 1.0;
        }
        vector
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::finance()
    }
}

#[async_trait]
impl PluginAdapter for MockEmbedder {
    fn name(&self) -> &str {
        "mock-embedder"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Embedding
    }

    async fn health_check(&self) -> Result<HealthStatus, FranklinError> {
        if self.failing.load(Ordering::SeqCst) {
            return Ok(HealthStatus::Unhealthy("mock embedder set to fail".to_string()));
        }
        Ok(HealthStatus::Healthy)
    }
}

#[async_trait]
impl EmbeddingAdapter for MockEmbedder {
    async fn embed(&self, input: EmbeddingInput) -> Result<EmbeddingOutput, FranklinError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(FranklinError::embedding("mock embedder set to fail"));
        }
        Ok(EmbeddingOutput {
            embeddings: input.texts.iter().map(|t| self.vector_for(t)).collect(),
            dimensions: self.dimensions,
        })
    }
}
