// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! LLM-based memory extraction from a conversational exchange.
//!
//! The extraction model reads the latest user/assistant exchange and
//! proposes `{type, content, importance}` candidates. Candidates at or above
//! the importance threshold are stored through [`SemanticMemory`]. Nothing
//! here returns an error to the conversation that triggered it.

use std::sync::Arc;
use std::time::Duration;

use franklin_config::model::MemoryConfig;
use franklin_core::types::{ProviderMessage, ProviderRequest};
use franklin_core::{Channel, FranklinError, ProviderAdapter};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::semantic::SemanticMemory;
use crate::types::{
    ExtractionReport, MAX_IMPORTANCE, MIN_IMPORTANCE, MemoryCandidate, MemoryType, NewMemory,
};

const EXTRACTION_PROMPT: &str = r#"You are reviewing a conversation between {assistant} (an AI wealth advisor) and a user.
List anything from the latest exchange worth remembering about the user in future conversations.

Look for:
- Financial goals, timelines, and liquidity needs
- Investment preferences and risk tolerance
- Holdings, income, or net worth
- Personal circumstances that affect their finances (family, job, location)
- Experience level, interests, and concerns

Each item needs:
- "type": one of fact, preference, event, context
- "content": a short standalone statement (e.g. "Prefers index funds over individual stocks")
- "importance": 1-3 trivial, 4-6 moderate, 7-10 important

Only include what was stated or clearly implied. If nothing is worth remembering, return [].

Respond with a JSON array only:
[{"type": "preference", "content": "Prefers long-term investing over day-trading", "importance": 7}]

Latest exchange:
User: {user_message}
{assistant}: {assistant_response}"#;

/// Tunables for [`MemoryExtractor`].
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub model: String,
    pub max_tokens: u32,
    /// Candidates below this importance are dropped.
    pub min_importance: u8,
    pub timeout: Duration,
    /// Speaker label for assistant lines in the prompt.
    pub assistant_name: String,
}

impl From<&MemoryConfig> for ExtractorSettings {
    fn from(config: &MemoryConfig) -> Self {
        Self {
            model: config.extraction_model.clone(),
            max_tokens: config.extraction_max_tokens,
            min_importance: config.min_importance,
            timeout: Duration::from_secs(config.extraction_timeout_secs),
            assistant_name: "Franklin".to_string(),
        }
    }
}

/// Turns conversational exchanges into stored memories.
pub struct MemoryExtractor {
    semantic: SemanticMemory,
    provider: Arc<dyn ProviderAdapter>,
    settings: ExtractorSettings,
}

impl MemoryExtractor {
    pub fn new(
        semantic: SemanticMemory,
        provider: Arc<dyn ProviderAdapter>,
        settings: ExtractorSettings,
    ) -> Self {
        Self {
            semantic,
            provider,
            settings,
        }
    }

    /// Run one extraction pass to completion.
    ///
    /// Provider errors, timeouts, unparseable output, and per-candidate
    /// store failures are logged and reflected in the report.
    pub async fn extract(
        &self,
        user_id: &str,
        channel: Channel,
        user_message: &str,
        assistant_response: &str,
    ) -> ExtractionReport {
        let mut report = ExtractionReport::default();

        let request = ProviderRequest {
            model: self.settings.model.clone(),
            system_prompt: None,
            messages: vec![ProviderMessage {
                role: "user".to_string(),
                content: build_prompt(&self.settings.assistant_name, user_message, assistant_response),
            }],
            max_tokens: self.settings.max_tokens,
            temperature: Some(0.0),
        };

        let response =
            match tokio::time::timeout(self.settings.timeout, self.provider.complete(request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!(user_id, %channel, error = %e, "memory extraction call failed");
                    return report;
                }
                Err(_) => {
                    let e = FranklinError::Timeout {
                        duration: self.settings.timeout,
                    };
                    warn!(user_id, %channel, error = %e, "memory extraction call failed");
                    return report;
                }
            };

        let candidates = match parse_candidates(&response.content) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(user_id, %channel, error = %e, "discarding extraction output");
                debug!(raw = %response.content, "unparseable extraction output");
                return report;
            }
        };
        report.candidates = candidates.len();

        for candidate in candidates {
            if candidate.importance < self.settings.min_importance {
                report.dropped += 1;
                continue;
            }
            let new = NewMemory {
                user_id: user_id.to_string(),
                channel,
                memory_type: candidate.memory_type,
                content: candidate.content,
                importance: candidate.importance,
            };
            match self.semantic.store(new).await {
                Ok(id) => report.stored.push(id),
                Err(e) => {
                    report.failed += 1;
                    warn!(user_id, %channel, error = %e, "failed to store extracted memory");
                }
            }
        }

        info!(
            user_id,
            %channel,
            candidates = report.candidates,
            stored = report.stored.len(),
            dropped = report.dropped,
            failed = report.failed,
            "memory extraction complete"
        );
        report
    }

    /// Spawn [`extract`](Self::extract) on the runtime without awaiting it.
    ///
    /// The caller may drop the handle; the outcome is then only visible in logs.
    pub fn dispatch(
        self: &Arc<Self>,
        user_id: String,
        channel: Channel,
        user_message: String,
        assistant_response: String,
    ) -> JoinHandle<ExtractionReport> {
        let extractor = Arc::clone(self);
        tokio::spawn(async move {
            extractor
                .extract(&user_id, channel, &user_message, &assistant_response)
                .await
        })
    }
}

/// Fill the extraction prompt with the latest exchange.
pub fn build_prompt(assistant_name: &str, user_message: &str, assistant_response: &str) -> String {
    EXTRACTION_PROMPT
        .replace("{assistant}", assistant_name)
        .replace("{user_message}", user_message)
        .replace("{assistant_response}", assistant_response)
}

/// Parse the extraction model's output into candidates.
///
/// Uses the first well-formed JSON array in the text, so markdown fences and
/// surrounding prose are tolerated. Elements that are not valid candidates
/// are skipped. Fails with `ExtractionParse` when no array is present.
pub fn parse_candidates(response: &str) -> Result<Vec<MemoryCandidate>, FranklinError> {
    let items = first_json_array(response).ok_or_else(|| {
        FranklinError::ExtractionParse("no JSON array in model output".to_string())
    })?;
    Ok(items.iter().filter_map(candidate_from_value).collect())
}

fn first_json_array(text: &str) -> Option<Vec<Value>> {
    text.match_indices('[').find_map(|(start, _)| {
        serde_json::Deserializer::from_str(&text[start..])
            .into_iter::<Vec<Value>>()
            .next()
            .and_then(Result::ok)
    })
}

fn candidate_from_value(value: &Value) -> Option<MemoryCandidate> {
    let obj = value.as_object()?;
    let content = obj.get("content")?.as_str()?.trim();
    if content.is_empty() {
        return None;
    }
    let memory_type = obj
        .get("type")
        .and_then(Value::as_str)
        .map(MemoryType::from_lenient)
        .unwrap_or(MemoryType::Context);
    let importance = match obj.get("importance")? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !importance.is_finite() {
        return None;
    }
    let importance = importance
        .round()
        .clamp(f64::from(MIN_IMPORTANCE), f64::from(MAX_IMPORTANCE)) as u8;
    Some(MemoryCandidate {
        memory_type,
        content: content.to_string(),
        importance,
    })
}
