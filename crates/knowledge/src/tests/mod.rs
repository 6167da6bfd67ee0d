//! Cross-module pipeline tests with hand-written gateway doubles.


use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::rag::GenerationGateway;
use docent_core::{AppError, AppResult};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Generator that records every call and echoes the context back.
#[derive(Default)]
pub(crate) struct RecordingGenerator {
    pub calls: Mutex<Vec<(String, String, String)>>,
}

impl RecordingGenerator {
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_context(&self) -> Option<String> {
        self.calls.lock().unwrap().last().map(|(_, context, _)| context.clone())
    }
}

#[async_trait::async_trait]
impl GenerationGateway for RecordingGenerator {
    async fn generate(&self, question: &str, context: &str, persona: &str) -> AppResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((question.to_string(), context.to_string(), persona.to_string()));
        Ok(format!("From the documents: {}", context))
    }
}

/// Embedder whose service is always down.
#[derive(Debug, Default)]
pub(crate) struct UnavailableEmbedder {
    pub calls: AtomicUsize,
}

#[async_trait::async_trait]
impl EmbeddingProvider for UnavailableEmbedder {
    fn provider_name(&self) -> &str {
        "unavailable"
    }

    fn model_name(&self) -> &str {
        "none"
    }

    fn dimensions(&self) -> usize {
        8
    }

    async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::UpstreamUnavailable("connection refused".to_string()))
    }
}

/// Embedder returning the same vector for every text.
#[derive(Debug)]
pub(crate) struct FixedEmbedder(pub Vec<f32>);

#[async_trait::async_trait]
impl EmbeddingProvider for FixedEmbedder {
    fn provider_name(&self) -> &str {
        "fixed"
    }

    fn model_name(&self) -> &str {
        "fixed"
    }

    fn dimensions(&self) -> usize {
        self.0.len()
    }

    async fn embed(&self, _text: &str) -> AppResult<Vec<f32>> {
        Ok(self.0.clone())
    }
}

/// Mock embedder that fails for any text containing `poison`.
#[derive(Debug)]
pub(crate) struct PoisonEmbedder {
    inner: MockProvider,
}

impl PoisonEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: MockProvider::new(dimensions),
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for PoisonEmbedder {
    fn provider_name(&self) -> &str {
        "poison"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.contains("poison") {
            return Err(AppError::UpstreamUnavailable("model rejected input".to_string()));
        }
        self.inner.embed(text).await
    }
}

/// `word` repeated into a paragraph of 149 characters.
pub(crate) fn paragraph(word: &str) -> String {
    vec![word; 25].join(" ")
}
