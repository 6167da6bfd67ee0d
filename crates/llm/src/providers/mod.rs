//! LLM provider implementations.

pub mod completion;
pub mod ollama;

pub use completion::CompletionClient;
pub use ollama::OllamaClient;

use docent_core::{AppError, AppResult};
use std::time::Duration;

/// Build an HTTP client with a bounded request timeout.
pub(crate) fn http_client(timeout: Duration) -> AppResult<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))
}

/// Map a non-success HTTP response to `UpstreamUnavailable`.
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> AppError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    AppError::UpstreamUnavailable(format!("{} API error ({}): {}", provider, status, error_text))
}
