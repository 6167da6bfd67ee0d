//! LLM integration crate for Docent.
//!
//! This crate provides a provider-agnostic abstraction for sending a fully
//! rendered prompt to a text-generation model and reading back the completion.
//!
//! # Providers
//! - **Completion**: generic REST completion endpoint (`{"prompt", ...}` -> `{"completion"}`)
//! - **Ollama**: Local LLM runtime
//!
//! # Example
//! ```no_run
//! use docent_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::with_base_url("http://localhost:11434", Duration::from_secs(60))?;
//! let request = LlmRequest::new("\n\nHuman: Hello\n\nAssistant:", "llama3")
//!     .with_stop_sequence("\n\nHuman:");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::{create_client, request_from_settings};
pub use providers::{CompletionClient, OllamaClient};
pub use types::ProviderType;
