// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the OpenAI-compatible embeddings API.

use std::time::Duration;

use franklin_core::FranklinError;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, EmbeddingData, EmbeddingRequest, EmbeddingResponse};

/// HTTP client for one embeddings endpoint.
///
/// Every failure is reported as [`FranklinError::EmbeddingUnavailable`],
/// timeouts included.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: reqwest::Client,
    endpoint: String,
    max_retries: u32,
}

impl OpenAiClient {
    /// Creates a client for `{base_url}/embeddings` with bearer auth.
    pub fn new(
        api_key: &str,
        base_url: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, FranklinError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| FranklinError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| FranklinError::EmbeddingUnavailable {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            max_retries,
        })
    }

    /// Embeds one batch and returns vectors in input order.
    pub async fn embed_batch(
        &self,
        model: &str,
        input: &[String],
        dimensions: Option<usize>,
    ) -> Result<Vec<Vec<f32>>, FranklinError> {
        let request = EmbeddingRequest {
            model,
            input,
            dimensions,
        };

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(attempt, "retrying embedding request after transient error");
                tokio::time::sleep(Duration::from_millis(500)).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .json(&request)
                .send()
                .await
                .map_err(request_error)?;

            let status = response.status();
            debug!(status = %status, attempt, batch = input.len(), "embedding response received");

            if status.is_success() {
                let body: EmbeddingResponse =
                    response.json().await.map_err(|e| FranklinError::EmbeddingUnavailable {
                        message: format!("malformed embedding response: {e}"),
                        source: Some(Box::new(e)),
                    })?;
                return order_by_index(body.data, input.len());
            }

            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!("embedding API error ({status}): {}", api_err.error.message),
                Err(_) => format!("embedding API returned {status}: {body}"),
            };

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(status = %status, "transient embedding error, will retry");
                last_error = Some(FranklinError::embedding(message));
                continue;
            }
            return Err(FranklinError::embedding(message));
        }

        Err(last_error.unwrap_or_else(|| FranklinError::embedding("embedding request failed after retries")))
    }
}

fn request_error(e: reqwest::Error) -> FranklinError {
    let message = if e.is_timeout() {
        "embedding request timed out".to_string()
    } else {
        format!("embedding request failed: {e}")
    };
    FranklinError::EmbeddingUnavailable {
        message,
        source: Some(Box::new(e)),
    }
}

/// Place each vector at its `index`, rejecting gaps, duplicates, and empties.
fn order_by_index(
    mut data: Vec<EmbeddingData>,
    expected: usize,
) -> Result<Vec<Vec<f32>>, FranklinError> {
    if data.len() != expected {
        return Err(FranklinError::embedding(format!(
            "embedding response size mismatch: expected {expected}, got {}",
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    if data.iter().enumerate().any(|(i, d)| d.index != i) {
        return Err(FranklinError::embedding("embedding response indices are not contiguous"));
    }
    if data.iter().any(|d| d.embedding.is_empty()) {
        return Err(FranklinError::embedding("embedding response contained an empty vector"));
    }
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

fn is_transient_error(status: reqwest::StatusCode) -> bool {
    status.as_u16() == 429 || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(uri: &str, max_retries: u32) -> OpenAiClient {
        OpenAiClient::new("sk-test", uri, Duration::from_secs(5), max_retries).unwrap()
    }

    #[tokio::test]
    async fn vectors_are_reordered_by_index() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "text-embedding-3-small",
                "input": ["a", "b"],
                "dimensions": 2
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "object": "list",
                "data": [
                    {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                    {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
                ],
                "model": "text-embedding-3-small"
            })))
            .mount(&server)
            .await;

        let input = vec!["a".to_string(), "b".to_string()];
        let vectors = client(&server.uri(), 0)
            .embed_batch("text-embedding-3-small", &input, Some(2))
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[tokio::test]
    async fn quota_error_is_embedding_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"message": "You exceeded your current quota", "type": "insufficient_quota"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let input = vec!["a".to_string()];
        let err = client(&server.uri(), 0)
            .embed_batch("m", &input, None)
            .await
            .unwrap_err();
        assert!(err.is_embedding_unavailable());
        assert!(err.to_string().contains("exceeded your current quota"), "got: {err}");
    }

    #[tokio::test]
    async fn transient_error_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.5]}]
            })))
            .mount(&server)
            .await;

        let input = vec!["a".to_string()];
        let vectors = client(&server.uri(), 1)
            .embed_batch("m", &input, None)
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.5]]);
    }

    #[tokio::test]
    async fn count_mismatch_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"index": 0, "embedding": [0.5]}]
            })))
            .mount(&server)
            .await;

        let input = vec!["a".to_string(), "b".to_string()];
        let err = client(&server.uri(), 0)
            .embed_batch("m", &input, None)
            .await
            .unwrap_err();
        assert!(err.is_embedding_unavailable());
    }

    #[tokio::test]
    async fn malformed_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let input = vec!["a".to_string()];
        let err = client(&server.uri(), 0)
            .embed_batch("m", &input, None)
            .await
            .unwrap_err();
        assert!(err.is_embedding_unavailable());
    }

    #[tokio::test]
    async fn timeout_is_embedding_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/embeddings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"data": []}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let slow = OpenAiClient::new("k", &server.uri(), Duration::from_millis(200), 0).unwrap();
        let input = vec!["a".to_string()];
        let err = slow.embed_batch("m", &input, None).await.unwrap_err();
        assert!(err.is_embedding_unavailable());
        assert!(err.to_string().contains("timed out"), "got: {err}");
    }

    #[test]
    fn empty_vector_is_rejected() {
        let data = vec![EmbeddingData {
            index: 0,
            embedding: vec![],
        }];
        assert!(order_by_index(data, 1).is_err());
    }
}
