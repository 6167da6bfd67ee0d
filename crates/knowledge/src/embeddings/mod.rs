//! Embedding gateway.
//!
//! Converts chunk and query text into fixed-dimension vectors through a
//! configured provider, optionally memoized by a content-addressed cache.

pub mod cache;
pub mod provider;
pub mod providers;

pub use cache::CachedEmbeddingProvider;
pub use provider::EmbeddingProvider;

use docent_core::config::EmbeddingSettings;
use docent_core::{AppConfig, AppError, AppResult, RetryPolicy};
use std::sync::Arc;
use std::time::Duration;

/// Create an embedding provider from the `embedding` settings.
///
/// # Errors
/// Returns `AppError::Config` for unknown providers, a missing REST endpoint,
/// or an unset API key variable.
pub fn create_provider(
    settings: &EmbeddingSettings,
    retry: &RetryPolicy,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    let timeout = Duration::from_secs(settings.timeout_secs);

    let provider: Arc<dyn EmbeddingProvider> = match settings.provider.as_str() {
        "mock" => Arc::new(providers::MockProvider::new(settings.dimensions)),

        "rest" => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                AppError::Config(
                    "embedding.endpoint is required for the rest provider".to_string(),
                )
            })?;
            let api_key = AppConfig::resolve_secret(settings.api_key_env.as_deref())?;
            Arc::new(providers::RestProvider::new(
                endpoint,
                settings.model.clone(),
                settings.dimensions,
                api_key,
                timeout,
                retry.clone(),
            )?)
        }

        "ollama" => Arc::new(providers::OllamaProvider::new(
            settings.endpoint.as_deref(),
            settings.model.clone(),
            settings.dimensions,
            timeout,
            retry.clone(),
        )?),

        _ => {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: '{}'. Supported providers: rest, ollama, mock",
                settings.provider
            )))
        }
    };

    tracing::debug!(
        "Created embedding provider: provider={}, model={}, dimensions={}, cache={}",
        provider.provider_name(),
        provider.model_name(),
        provider.dimensions(),
        settings.cache
    );

    if settings.cache {
        Ok(Arc::new(CachedEmbeddingProvider::new(provider)))
    } else {
        Ok(provider)
    }
}
