//! Content-addressed embedding cache.

use crate::embeddings::provider::EmbeddingProvider;
use docent_core::AppResult;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Wraps a provider and memoizes embeddings by SHA-256 of model and text.
#[derive(Debug)]
pub struct CachedEmbeddingProvider {
    inner: Arc<dyn EmbeddingProvider>,
    entries: RwLock<HashMap<[u8; 32], Vec<f32>>>,
}

impl CachedEmbeddingProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached embeddings.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn key(&self, text: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.inner.model_name().as_bytes());
        hasher.update([0u8]);
        hasher.update(text.as_bytes());
        let digest = hasher.finalize();
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        key
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for CachedEmbeddingProvider {
    fn provider_name(&self) -> &str {
        self.inner.provider_name()
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let key = self.key(text);

        // A poisoned lock only loses memoization; fall through to the provider.
        let cached = self
            .entries
            .read()
            .ok()
            .and_then(|entries| entries.get(&key).cloned());
        if let Some(hit) = cached {
            tracing::trace!("Embedding cache hit");
            return Ok(hit);
        }

        let embedding = self.inner.embed(text).await?;

        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, embedding.clone());
        }

        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::AppError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn provider_name(&self) -> &str {
            "counting"
        }

        fn model_name(&self) -> &str {
            "counting-v1"
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
            if text.is_empty() {
                return Err(AppError::InvalidInput("empty".to_string()));
            }
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![text.len() as f32, n as f32])
        }
    }

    #[tokio::test]
    async fn test_repeated_text_hits_cache() {
        let inner = Arc::new(CountingProvider::default());
        let cache = CachedEmbeddingProvider::new(inner.clone());

        let first = cache.embed("baggage").await.unwrap();
        let second = cache.embed("baggage").await.unwrap();
        let other = cache.embed("pets").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let inner = Arc::new(CountingProvider::default());
        let cache = CachedEmbeddingProvider::new(inner);

        assert!(cache.embed("").await.is_err());
        assert!(cache.is_empty());
    }
}
