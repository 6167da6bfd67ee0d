//! Generic REST completion provider.
//!
//! Wire contract:
//! `POST {endpoint}` with `{"prompt", "max_tokens", "temperature", "top_p", "stop_sequences"}`
//! answered by `{"completion": string}`.

use super::{http_client, status_error};
use crate::client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use docent_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::instrument;

/// Completion API request format.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    stop_sequences: &'a [String],
}

/// Completion API response format.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    completion: String,
}

/// Client for a REST completion endpoint.
pub struct CompletionClient {
    endpoint: String,

    /// Bearer token, when the endpoint requires one
    api_key: Option<String>,

    client: reqwest::Client,
}

impl CompletionClient {
    /// Create a client for `endpoint` with the given request timeout.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        Ok(Self {
            endpoint: endpoint.into(),
            api_key,
            client: http_client(timeout)?,
        })
    }

    fn to_wire<'a>(&self, request: &'a LlmRequest) -> CompletionRequest<'a> {
        CompletionRequest {
            prompt: &request.prompt,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            top_p: request.top_p,
            stop_sequences: &request.stop_sequences,
        }
    }
}

/// Parse a completion response body.
fn parse_completion(body: &str) -> AppResult<String> {
    let response: CompletionResponse = serde_json::from_str(body).map_err(|e| {
        AppError::MalformedResponse(format!("Failed to parse completion response: {}", e))
    })?;
    Ok(response.completion)
}

#[async_trait::async_trait]
impl LlmClient for CompletionClient {
    fn provider_name(&self) -> &str {
        "completion"
    }

    #[instrument(skip(self, request), fields(model = %request.model, prompt_len = request.prompt.len()))]
    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::debug!("Sending completion request to {}", self.endpoint);

        let mut builder = self.client.post(&self.endpoint).json(&self.to_wire(request));
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Failed to send completion request: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(status_error("Completion", response).await);
        }

        let body = response.text().await.map_err(|e| {
            AppError::UpstreamUnavailable(format!("Failed to read completion response: {}", e))
        })?;
        let content = parse_completion(&body)?;

        tracing::debug!("Received completion ({} chars)", content.len());

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CompletionClient {
        CompletionClient::new("http://localhost:9/complete", None, Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn test_wire_request_fields() {
        let request = LlmRequest::new("\n\nHuman: hi\n\nAssistant:", "claude")
            .with_max_tokens(512)
            .with_temperature(0.3)
            .with_top_p(0.9)
            .with_stop_sequence("\n\nHuman:");

        let client = client();
        let json = serde_json::to_value(client.to_wire(&request)).unwrap();
        assert_eq!(json["prompt"], "\n\nHuman: hi\n\nAssistant:");
        assert_eq!(json["max_tokens"], 512);
        assert_eq!(json["stop_sequences"][0], "\n\nHuman:");
        assert!((json["top_p"].as_f64().unwrap() - 0.9).abs() < 1e-6);
        assert!(json.get("model").is_none());
    }

    #[test]
    fn test_parse_completion() {
        let text = parse_completion(r#"{"completion": " 23kg per bag.", "stop_reason": "stop"}"#).unwrap();
        assert_eq!(text, " 23kg per bag.");
    }

    #[test]
    fn test_parse_completion_wrong_shape() {
        let err = parse_completion(r#"{"text": "hi"}"#).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));

        let err = parse_completion("<html>oops</html>").unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_upstream_unavailable() {
        let request = LlmRequest::new("prompt", "model");
        let err = client().complete(&request).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamUnavailable(_)));
    }
}
