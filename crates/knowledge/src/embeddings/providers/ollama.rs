//! Ollama Embedding Provider
//!
//! Provides semantic embeddings via Ollama's local API using models like nomic-embed-text.
//!
//! # Features
//! - Local-first (no API costs, privacy-preserving)
//! - Automatic retry with exponential backoff
//!
//! # Example
//! ```no_run
//! use docent_core::RetryPolicy;
//! use docent_knowledge::embeddings::EmbeddingProvider;
//! use docent_knowledge::embeddings::providers::OllamaProvider;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = OllamaProvider::new(
//!     None,
//!     "nomic-embed-text",
//!     768,
//!     Duration::from_secs(30),
//!     RetryPolicy::default(),
//! )?;
//! let embedding = provider.embed("Hello world").await?;
//! assert_eq!(embedding.len(), 768);
//! # Ok(())
//! # }
//! ```

use crate::embeddings::provider::{ensure_dimensions, ensure_embeddable, EmbeddingProvider};
use docent_core::{AppError, AppResult, RetryPolicy};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Ollama API endpoint for embeddings
const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Ollama embedding provider using local API
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    /// HTTP client for API requests
    client: Client,
    /// Ollama API base URL
    base_url: String,
    /// Model name (e.g., "nomic-embed-text")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
    retry: RetryPolicy,
}

/// Request payload for Ollama embeddings API
#[derive(Debug, Clone, Serialize)]
struct EmbeddingRequest<'a> {
    /// Model name to use
    model: &'a str,
    /// Text to embed
    prompt: &'a str,
}

/// Response from Ollama embeddings API
#[derive(Debug, Clone, Deserialize)]
struct EmbeddingResponse {
    /// Embedding vector
    embedding: Vec<f32>,
}

/// Error response from Ollama API
#[derive(Debug, Clone, Deserialize)]
struct ErrorResponse {
    /// Error message
    error: String,
}

impl OllamaProvider {
    /// Create new Ollama provider.
    ///
    /// `base_url` falls back to `OLLAMA_URL`, then to the local default.
    pub fn new(
        base_url: Option<&str>,
        model: impl Into<String>,
        dimensions: usize,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for Ollama: {}", e))
        })?;

        let base_url = match base_url {
            Some(url) => url.to_string(),
            None => std::env::var("OLLAMA_URL").unwrap_or_else(|_| DEFAULT_OLLAMA_URL.to_string()),
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            dimensions,
            retry,
        })
    }

    /// Embed single text (no retries)
    #[instrument(skip(self, text), fields(text_len = text.len()))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);

        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        debug!("Sending embedding request to {}", url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                AppError::UpstreamUnavailable(format!("Failed to send request to Ollama: {}", e))
            })?;

        let status = response.status();

        if !status.is_success() {
            // Try to parse error response
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            let detail = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|r| r.error)
                .unwrap_or(error_text);

            return Err(AppError::UpstreamUnavailable(format!(
                "Ollama API error ({}): {}. Ensure model '{}' is installed (ollama pull {})",
                status, detail, self.model, self.model
            )));
        }

        let response_body: EmbeddingResponse = response.json().await.map_err(|e| {
            AppError::MalformedResponse(format!("Failed to parse Ollama response: {}", e))
        })?;

        ensure_dimensions(response_body.embedding, self.dimensions)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), provider = "ollama", model = %self.model))]
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        ensure_embeddable(text)?;
        self.retry
            .run("Ollama embedding", || self.embed_single(text))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> OllamaProvider {
        OllamaProvider::new(
            Some(base_url),
            "nomic-embed-text",
            768,
            Duration::from_secs(1),
            RetryPolicy::none(),
        )
        .unwrap()
    }

    #[test]
    fn test_provider_metadata() {
        let provider = provider("http://gpu-box:11434/");
        assert_eq!(provider.base_url, "http://gpu-box:11434");
        assert_eq!(provider.dimensions(), 768);
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(EmbeddingRequest {
            model: "nomic-embed-text",
            prompt: "hello",
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"model": "nomic-embed-text", "prompt": "hello"}));
    }

    #[tokio::test]
    async fn test_empty_text() {
        let result = provider("http://127.0.0.1:9").embed("").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let result = provider("http://127.0.0.1:9").embed("hello").await;
        assert!(matches!(result, Err(AppError::UpstreamUnavailable(_))));
    }
}
