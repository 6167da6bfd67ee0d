//! Embedding provider implementations.

pub mod mock;
pub mod ollama;
pub mod rest;

pub use mock::MockProvider;
pub use ollama::OllamaProvider;
pub use rest::RestProvider;
