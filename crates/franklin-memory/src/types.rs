// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the long-term memory system.

use franklin_core::Channel;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lowest and highest importance a memory may carry.
pub const MIN_IMPORTANCE: u8 = 1;
pub const MAX_IMPORTANCE: u8 = 10;

/// Category of a memory. Used for prompt labeling and list filtering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum MemoryType {
    Fact,
    Preference,
    Event,
    Context,
}

impl MemoryType {
    /// Convert to string for SQLite storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryType::Fact => "fact",
            MemoryType::Preference => "preference",
            MemoryType::Event => "event",
            MemoryType::Context => "context",
        }
    }

    /// Upper-case label used in the context block, e.g. `[PREFERENCE]`.
    pub fn label(&self) -> &'static str {
        match self {
            MemoryType::Fact => "FACT",
            MemoryType::Preference => "PREFERENCE",
            MemoryType::Event => "EVENT",
            MemoryType::Context => "CONTEXT",
        }
    }

    /// Parse model output; anything unrecognized becomes `Context`.
    pub fn from_lenient(s: &str) -> Self {
        s.trim().parse().unwrap_or(MemoryType::Context)
    }
}

/// A single remembered fact, preference, event, or context snippet.
///
/// Only `last_accessed_at` and `access_count` ever change after insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    pub user_id: String,
    pub channel: Channel,
    pub memory_type: MemoryType,
    pub content: String,
    /// Embedding of `content`, computed once at creation.
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// 1-10. Ranks ties and decides decay eligibility.
    pub importance: u8,
    pub created_at: String,
    pub last_accessed_at: Option<String>,
    pub access_count: u32,
}

/// Caller-supplied fields for a memory about to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMemory {
    pub user_id: String,
    pub channel: Channel,
    pub memory_type: MemoryType,
    pub content: String,
    pub importance: u8,
}

/// A memory with its similarity to a search query.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub memory: Memory,
    /// Cosine similarity in `[-1, 1]`.
    pub similarity: f32,
}

/// A memory proposed by the extraction model, before filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryCandidate {
    pub memory_type: MemoryType,
    pub content: String,
    /// Already clamped to 1-10.
    pub importance: u8,
}

/// Outcome of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionReport {
    /// Well-formed candidates the model proposed.
    pub candidates: usize,
    /// Ids of memories persisted from this pass.
    pub stored: Vec<String>,
    /// Candidates below the importance threshold.
    pub dropped: usize,
    /// Candidates that passed the threshold but could not be stored.
    pub failed: usize,
}

/// Convert f32 vector to bytes for SQLite BLOB storage.
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert SQLite BLOB back to f32 vector. Trailing partial chunks are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

/// Cosine similarity of two vectors.
///
/// Returns 0.0 for mismatched lengths or a zero-magnitude input, so a
/// dimensionality change never matches anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Truncate to at most `max_chars` characters, never splitting a code point.
pub fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
