// SPDX-FileCopyrightText: 2026 Franklin Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Request/response types for the OpenAI `/embeddings` endpoint.

use serde::{Deserialize, Serialize};

/// Body of a `POST /embeddings` request.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
    /// Only honored by `text-embedding-3-*` models.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    pub data: Vec<EmbeddingData>,
    #[serde(default)]
    pub model: String,
}

/// One vector in a response. `index` refers to the position in `input`;
/// the API does not promise `data` comes back in input order.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    pub index: usize,
    pub embedding: Vec<f32>,
}

/// Error body returned on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    pub message: String,
    #[serde(rename = "type", default)]
    pub type_: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_dimensions_when_set() {
        let input = vec!["hello".to_string()];
        let req = EmbeddingRequest {
            model: "text-embedding-3-small",
            input: &input,
            dimensions: Some(8),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["dimensions"], 8);
        assert_eq!(json["input"][0], "hello");

        let req = EmbeddingRequest {
            dimensions: None,
            ..req
        };
        assert!(serde_json::to_value(&req).unwrap().get("dimensions").is_none());
    }

    #[test]
    fn error_body_without_type_parses() {
        let body = r#"{"error": {"message": "quota exceeded"}}"#;
        let parsed: ApiErrorResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.message, "quota exceeded");
        assert!(parsed.error.type_.is_none());
    }
}
