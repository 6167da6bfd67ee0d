//! Embedding provider trait and input/output checks shared by providers.

use docent_core::{AppError, AppResult};

/// Trait for embedding providers.
///
/// `embed` fails with:
/// - `InvalidInput` for empty or whitespace-only text
/// - `UpstreamUnavailable` when the service is unreachable or returns an error status
/// - `MalformedResponse` when the body has the wrong shape or dimension
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "rest", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate the embedding for a single text.
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>>;
}

/// Reject empty or whitespace-only input.
pub fn ensure_embeddable(text: &str) -> AppResult<()> {
    if text.trim().is_empty() {
        return Err(AppError::InvalidInput("Cannot embed empty text".to_string()));
    }
    Ok(())
}

/// Reject vectors whose length differs from the configured dimension.
pub fn ensure_dimensions(embedding: Vec<f32>, expected: usize) -> AppResult<Vec<f32>> {
    if embedding.len() != expected {
        return Err(AppError::MalformedResponse(format!(
            "Unexpected embedding dimensions: got {}, expected {}",
            embedding.len(),
            expected
        )));
    }
    Ok(embedding)
}
