//! REST embedding provider.
//!
//! Wire contract: `POST {endpoint}` with `{"inputText": string}`, answered by
//! `{"embedding": [f32; D]}`.

use crate::embeddings::provider::{ensure_dimensions, ensure_embeddable, EmbeddingProvider};
use docent_core::{AppError, AppResult, RetryPolicy};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbeddingRequest<'a> {
    input_text: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedding provider for a generic REST embedding endpoint.
#[derive(Debug, Clone)]
pub struct RestProvider {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl RestProvider {
    /// Create a provider for `endpoint`.
    ///
    /// # Arguments
    /// * `endpoint` - Full URL receiving the embedding POST
    /// * `model` - Model label used in logs
    /// * `dimensions` - Expected vector length
    /// * `api_key` - Optional bearer token
    /// * `timeout` - Per-request timeout
    /// * `retry` - Policy applied to transient failures
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimensions: usize,
        api_key: Option<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for embeddings: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            dimensions,
            api_key,
            retry,
        })
    }

    /// Embed single text (no retries)
    async fn embed_once(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut builder = self
            .client
            .post(&self.endpoint)
            .json(&EmbeddingRequest { input_text: text });
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Failed to send embedding request: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::UpstreamUnavailable(format!(
                "Embedding API error ({}): {}",
                status, error_text
            )));
        }

        let body = response.text().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Failed to read embedding response: {}", e))
        })?;

        parse_embedding(&body, self.dimensions)
    }
}

/// Parse an embedding response body and check its dimension.
fn parse_embedding(body: &str, dimensions: usize) -> AppResult<Vec<f32>> {
    let response: EmbeddingResponse = serde_json::from_str(body).map_err(|e| {
        AppError::MalformedResponse(format!("Failed to parse embedding response: {}", e))
    })?;
    ensure_dimensions(response.embedding, dimensions)
}

#[async_trait::async_trait]
impl EmbeddingProvider for RestProvider {
    fn provider_name(&self) -> &str {
        "rest"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "rest", model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        ensure_embeddable(text)?;
        self.retry
            .run("embedding request", || self.embed_once(text))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(dimensions: usize) -> RestProvider {
        RestProvider::new(
            "http://127.0.0.1:9/embed",
            "amazon.titan-embed-text-v1",
            dimensions,
            None,
            Duration::from_secs(1),
            RetryPolicy::none(),
        )
        .unwrap()
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(EmbeddingRequest {
            input_text: "What is the baggage allowance?",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"inputText": "What is the baggage allowance?"}));
    }

    #[test]
    fn test_parse_embedding() {
        let embedding = parse_embedding(r#"{"embedding": [0.5, -0.25, 1.0], "inputTextTokenCount": 4}"#, 3).unwrap();
        assert_eq!(embedding, vec![0.5, -0.25, 1.0]);
    }

    #[test]
    fn test_parse_embedding_wrong_dimension() {
        let err = parse_embedding(r#"{"embedding": [0.5, -0.25]}"#, 3).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_embedding_wrong_shape() {
        let err = parse_embedding(r#"{"vector": [0.5]}"#, 1).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected_before_any_request() {
        let err = provider(3).embed("  ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let err = provider(3).embed("hello").await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }
}
