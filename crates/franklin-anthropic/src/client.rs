// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Non-streaming HTTP client for the Anthropic Messages API.

use std::time::Duration;

use franklin_core::FranklinError;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};

use crate::types::{ApiErrorResponse, MessageRequest, MessageResponse};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

const RETRY_PAUSE: Duration = Duration::from_secs(1);

/// One failed attempt and whether another one may succeed.
struct AttemptError {
    error: FranklinError,
    retryable: bool,
}

/// Authenticated client for one Messages endpoint.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    max_retries: u32,
}

impl AnthropicClient {
    /// `timeout` bounds each HTTP attempt; `max_retries` extra attempts are
    /// made on rate limiting and overload.
    pub fn new(
        api_key: &str,
        api_version: &str,
        timeout: Duration,
        max_retries: u32,
    ) -> Result<Self, FranklinError> {
        let mut headers = HeaderMap::new();
        let mut key = header_value("API key", api_key)?;
        key.set_sensitive(true);
        headers.insert(HeaderName::from_static("x-api-key"), key);
        headers.insert(
            HeaderName::from_static("anthropic-version"),
            header_value("API version", api_version)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| FranklinError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            url: MESSAGES_URL.to_string(),
            timeout,
            max_retries,
        })
    }

    /// Point the client at another endpoint.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Send `request`, retrying retryable failures.
    pub async fn complete_message(
        &self,
        request: &MessageRequest,
    ) -> Result<MessageResponse, FranklinError> {
        let mut attempt = 0;
        loop {
            match self.attempt(request).await {
                Ok(response) => return Ok(response),
                Err(failure) if failure.retryable && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %failure.error, "retrying completion request");
                    tokio::time::sleep(RETRY_PAUSE).await;
                }
                Err(failure) => return Err(failure.error),
            }
        }
    }

    async fn attempt(&self, request: &MessageRequest) -> Result<MessageResponse, AttemptError> {
        let response = self
            .http
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| AttemptError {
                error: self.transport_error(e),
                retryable: false,
            })?;

        let status = response.status();
        debug!(%status, model = %request.model, "completion response received");

        let body = response.text().await.map_err(|e| AttemptError {
            error: self.transport_error(e),
            retryable: false,
        })?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| AttemptError {
                error: FranklinError::Provider {
                    message: format!("unexpected completion body: {e}"),
                    source: Some(Box::new(e)),
                },
                retryable: false,
            });
        }

        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(parsed) => format!(
                "Anthropic API error {status} ({}): {}",
                parsed.error.type_, parsed.error.message
            ),
            Err(_) => format!("Anthropic API returned {status}: {body}"),
        };
        Err(AttemptError {
            error: FranklinError::Provider {
                message,
                source: None,
            },
            retryable: is_retryable(status),
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> FranklinError {
        if e.is_timeout() {
            return FranklinError::Timeout {
                duration: self.timeout,
            };
        }
        FranklinError::Provider {
            message: format!("completion request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}

fn header_value(what: &str, value: &str) -> Result<HeaderValue, FranklinError> {
    HeaderValue::from_str(value)
        .map_err(|e| FranklinError::Config(format!("invalid {what} header value: {e}")))
}

/// Rate limiting and 5xx (including 529 overload) are worth another attempt.
fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiMessage;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer, max_retries: u32) -> AnthropicClient {
        AnthropicClient::new("sk-ant-test", "2023-06-01", Duration::from_secs(5), max_retries)
            .unwrap()
            .with_url(server.uri())
    }

    fn extraction_request() -> MessageRequest {
        MessageRequest {
            model: "claude-3-5-haiku-20241022".into(),
            messages: vec![ApiMessage {
                role: "user".into(),
                content: "User: I just bought a house".into(),
            }],
            system: None,
            max_tokens: 1024,
            temperature: Some(0.0),
        }
    }

    fn message(text: &str) -> serde_json::Value {
        serde_json::json!({
            "id": "msg_01",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": text}],
            "model": "claude-3-5-haiku-20241022",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 42, "output_tokens": 7}
        })
    }

    fn api_error(kind: &str) -> serde_json::Value {
        serde_json::json!({"type": "error", "error": {"type": kind, "message": "nope"}})
    }

    #[tokio::test]
    async fn sends_auth_headers_and_parses_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "sk-ant-test"))
            .and(header("anthropic-version", "2023-06-01"))
            .and(body_partial_json(serde_json::json!({"temperature": 0.0, "max_tokens": 1024})))
            .respond_with(ResponseTemplate::new(200).set_body_json(message("[]")))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server, 0)
            .complete_message(&extraction_request())
            .await
            .unwrap();
        assert_eq!(response.text(), "[]");
        assert_eq!(response.usage.input_tokens, 42);
    }

    #[tokio::test]
    async fn overload_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_json(api_error("overloaded_error")))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(message("ok")))
            .mount(&server)
            .await;

        let response = client(&server, 1)
            .complete_message(&extraction_request())
            .await
            .unwrap();
        assert_eq!(response.text(), "ok");
    }

    #[tokio::test]
    async fn retries_stop_at_the_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_json(api_error("rate_limit_error")))
            .expect(2)
            .mount(&server)
            .await;

        let err = client(&server, 1)
            .complete_message(&extraction_request())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("rate_limit_error"), "got: {err}");
    }

    #[tokio::test]
    async fn bad_request_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(api_error("invalid_request_error")))
            .expect(1)
            .mount(&server)
            .await;

        let err = client(&server, 3)
            .complete_message(&extraction_request())
            .await
            .unwrap_err();
        assert!(matches!(err, FranklinError::Provider { .. }));
        assert!(err.to_string().contains("invalid_request_error"), "got: {err}");
    }

    #[tokio::test]
    async fn slow_response_maps_to_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(message("late"))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = AnthropicClient::new("k", "2023-06-01", Duration::from_millis(200), 0)
            .unwrap()
            .with_url(server.uri());
        let err = client.complete_message(&extraction_request()).await.unwrap_err();
        assert!(matches!(err, FranklinError::Timeout { .. }), "got: {err}");
    }
}
