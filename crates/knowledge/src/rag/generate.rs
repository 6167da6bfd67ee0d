//! Generation gateway: grounded prompt -> completion.

use docent_core::config::GenerationSettings;
use docent_core::{AppResult, RetryPolicy};
use docent_llm::{request_from_settings, LlmClient};
use docent_prompt::{build_grounded_prompt, PromptDefinition};
use std::sync::Arc;
use tracing::instrument;

/// Produces an answer bound to a persona and a retrieved context.
#[async_trait::async_trait]
pub trait GenerationGateway: Send + Sync {
    /// Generate a completion for `question` using only `context`.
    ///
    /// The returned text is trimmed.
    async fn generate(&self, question: &str, context: &str, persona: &str) -> AppResult<String>;
}

/// Generation gateway backed by an LLM client and a prompt definition.
pub struct LlmGenerationGateway {
    client: Arc<dyn LlmClient>,
    prompt: PromptDefinition,
    settings: GenerationSettings,
    retry: RetryPolicy,
}

impl LlmGenerationGateway {
    pub fn new(
        client: Arc<dyn LlmClient>,
        prompt: PromptDefinition,
        settings: GenerationSettings,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            prompt,
            settings,
            retry,
        }
    }
}

#[async_trait::async_trait]
impl GenerationGateway for LlmGenerationGateway {
    #[instrument(skip_all, fields(provider = self.client.provider_name(), prompt_id = %self.prompt.id))]
    async fn generate(&self, question: &str, context: &str, persona: &str) -> AppResult<String> {
        let built = build_grounded_prompt(&self.prompt, persona, context, question)?;
        tracing::debug!(
            "Rendered prompt '{}' ({} context chars)",
            built.metadata.source_prompt_id,
            built.metadata.context_chars
        );

        let request = request_from_settings(built.text, &self.settings);
        let response = self
            .retry
            .run("generation request", || self.client.complete(&request))
            .await?;

        tracing::debug!(
            "Generation completed: model={}, completion_tokens={}",
            response.model,
            response.usage.completion_tokens
        );

        Ok(response.content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::AppError;
    use docent_llm::{LlmRequest, LlmResponse, LlmUsage};
    use docent_prompt::{builtin_prompt, GROUNDED_PROMPT_ID};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Records requests and fails a configurable number of times first.
    struct ScriptedClient {
        failures: AtomicU32,
        calls: AtomicU32,
        last_request: Mutex<Option<LlmRequest>>,
    }

    impl ScriptedClient {
        fn new(failures: u32) -> Self {
            Self {
                failures: AtomicU32::new(failures),
                calls: AtomicU32::new(0),
                last_request: Mutex::new(None),
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmClient for ScriptedClient {
        fn provider_name(&self) -> &str {
            "scripted"
        }

        async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().unwrap() = Some(request.clone());
            if self.failures.load(Ordering::SeqCst) > 0 {
                self.failures.fetch_sub(1, Ordering::SeqCst);
                return Err(AppError::UpstreamUnavailable("503".to_string()));
            }
            Ok(LlmResponse {
                content: "  The allowance is 23kg.\n".to_string(),
                model: request.model.clone(),
                usage: LlmUsage::default(),
            })
        }
    }

    fn gateway(client: Arc<ScriptedClient>, retry: RetryPolicy) -> LlmGenerationGateway {
        LlmGenerationGateway::new(
            client,
            builtin_prompt(GROUNDED_PROMPT_ID).unwrap(),
            GenerationSettings::default(),
            retry,
        )
    }

    #[tokio::test]
    async fn test_generate_renders_prompt_and_trims() {
        let client = Arc::new(ScriptedClient::new(0));
        let answer = gateway(client.clone(), RetryPolicy::none())
            .generate("What is the baggage allowance?", "Baggage allowance is 23kg per checked bag.", "You are a travel agent.")
            .await
            .unwrap();

        assert_eq!(answer, "The allowance is 23kg.");

        let request = client.last_request.lock().unwrap().clone().unwrap();
        assert!(request.prompt.contains("You are a travel agent."));
        assert!(request.prompt.contains("Baggage allowance is 23kg per checked bag."));
        assert!(request.prompt.contains("What is the baggage allowance?"));
        assert_eq!(request.max_tokens, Some(512));
        assert_eq!(request.temperature, Some(0.3));
        assert_eq!(request.top_p, Some(0.9));
        assert_eq!(request.stop_sequences, vec!["\n\nHuman:".to_string()]);
    }

    #[tokio::test]
    async fn test_generate_retries_transient_failures() {
        let client = Arc::new(ScriptedClient::new(1));
        let retry = RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 1,
        };
        let answer = gateway(client.clone(), retry)
            .generate("q", "c", "p")
            .await
            .unwrap();
        assert_eq!(answer, "The allowance is 23kg.");
        assert_eq!(client.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_generate_surfaces_upstream_error() {
        let client = Arc::new(ScriptedClient::new(5));
        let err = gateway(client.clone(), RetryPolicy::none())
            .generate("q", "c", "p")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
    }
}
