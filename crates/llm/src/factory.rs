//! LLM provider factory.
//!
//! This module creates LLM clients from the generation settings. It handles
//! provider resolution, secret injection, and request defaults.

use crate::client::{LlmClient, LlmRequest};
use crate::providers::{CompletionClient, OllamaClient};
use crate::types::ProviderType;
use docent_core::config::GenerationSettings;
use docent_core::{AppConfig, AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Default Ollama endpoint.
const OLLAMA_ENDPOINT: &str = "http://localhost:11434";

/// Create an LLM client based on the generation settings.
///
/// # Arguments
/// * `settings` - The `generation` section of the application config
///
/// # Errors
/// Returns `AppError::Config` if:
/// - Provider is unknown
/// - The completion provider has no endpoint
/// - A configured API key variable is not set
pub fn create_client(settings: &GenerationSettings) -> AppResult<Arc<dyn LlmClient>> {
    let provider = ProviderType::parse(&settings.provider).ok_or_else(|| {
        AppError::Config(format!("Unknown generation provider: {}", settings.provider))
    })?;
    let timeout = Duration::from_secs(settings.timeout_secs);

    match provider {
        ProviderType::Completion => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                AppError::Config(
                    "generation.endpoint is required for the completion provider".to_string(),
                )
            })?;
            let api_key = AppConfig::resolve_secret(settings.api_key_env.as_deref())?;
            tracing::debug!("Using completion endpoint {}", endpoint);
            Ok(Arc::new(CompletionClient::new(endpoint, api_key, timeout)?))
        }
        ProviderType::Ollama => {
            let base_url = settings.endpoint.as_deref().unwrap_or(OLLAMA_ENDPOINT);
            Ok(Arc::new(OllamaClient::with_base_url(base_url, timeout)?))
        }
    }
}

/// Build a request for `prompt` carrying the configured sampling parameters.
pub fn request_from_settings(prompt: impl Into<String>, settings: &GenerationSettings) -> LlmRequest {
    settings.stop_sequences.iter().fold(
        LlmRequest::new(prompt, settings.model.clone())
            .with_max_tokens(settings.max_tokens)
            .with_temperature(settings.temperature)
            .with_top_p(settings.top_p),
        |request, stop| request.with_stop_sequence(stop.clone()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let settings = GenerationSettings {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider_name(), "ollama");
    }

    #[test]
    fn test_completion_requires_endpoint() {
        let settings = GenerationSettings::default();
        match create_client(&settings) {
            Err(AppError::Config(msg)) => assert!(msg.contains("endpoint")),
            _ => panic!("Expected config error for completion without endpoint"),
        }
    }

    #[test]
    fn test_create_completion_client() {
        let settings = GenerationSettings {
            endpoint: Some("http://localhost:8080/complete".to_string()),
            ..Default::default()
        };
        let client = create_client(&settings).unwrap();
        assert_eq!(client.provider_name(), "completion");
    }

    #[test]
    fn test_missing_api_key_env() {
        let settings = GenerationSettings {
            endpoint: Some("http://localhost:8080/complete".to_string()),
            api_key_env: Some("DOCENT_TEST_SURELY_UNSET_KEY".to_string()),
            ..Default::default()
        };
        assert!(matches!(create_client(&settings), Err(AppError::Config(_))));
    }

    #[test]
    fn test_unknown_provider() {
        let settings = GenerationSettings {
            provider: "unknown".to_string(),
            ..Default::default()
        };
        assert!(matches!(create_client(&settings), Err(AppError::Config(_))));
    }

    #[test]
    fn test_request_from_settings() {
        let request = request_from_settings("prompt", &GenerationSettings::default());
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.top_p, Some(0.9));
        assert_eq!(request.stop_sequences, vec!["\n\nHuman:".to_string()]);
    }
}
