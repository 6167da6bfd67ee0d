//! Vector index abstraction for knowledge chunks.
//!
//! Defines a trait for backend-agnostic vector storage and k-NN retrieval,
//! plus the similarity scores shared by backends.

use crate::types::{IndexedDocument, SearchHit};
use docent_core::config::VectorStoreSettings;
use docent_core::{AppError, AppResult, DistanceMetric};
use serde::{Deserialize, Serialize};

/// HNSW graph parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnParams {
    pub engine: String,
    pub ef_construction: u32,
    pub m: u32,
    pub ef_search: u32,
}

impl Default for AnnParams {
    fn default() -> Self {
        Self {
            engine: "nmslib".to_string(),
            ef_construction: 256,
            m: 48,
            ef_search: 100,
        }
    }
}

/// Declared shape of an index: vector dimension, metric, and graph parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub ann: AnnParams,
}

impl IndexSpec {
    pub fn new(dimension: usize, metric: DistanceMetric) -> Self {
        Self {
            dimension,
            metric,
            ann: AnnParams::default(),
        }
    }

    /// Build the spec from the `vectorStore` settings and the embedding dimension.
    pub fn from_settings(dimension: usize, settings: &VectorStoreSettings) -> Self {
        Self {
            dimension,
            metric: settings.metric,
            ann: AnnParams {
                engine: settings.engine.clone(),
                ef_construction: settings.ef_construction,
                m: settings.m,
                ef_search: settings.ef_search,
            },
        }
    }

    /// Reject a zero dimension.
    pub fn validate(&self) -> AppResult<()> {
        if self.dimension == 0 {
            return Err(AppError::IndexCreation(
                "Index dimension must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for vector index backends.
///
/// Implementations must support:
/// - Destructive (re)creation with a fixed dimension and metric
/// - Appending documents whose embedding matches the dimension
/// - Top-k search, nearest first (empty for absent indexes or `k == 0`)
/// - Counting documents (0 for absent indexes)
#[async_trait::async_trait]
pub trait VectorIndex: Send + Sync {
    /// Backend name (e.g., "sqlite", "opensearch").
    fn backend_name(&self) -> &str;

    /// Delete any index called `name`, then create it empty.
    async fn create_index(&self, name: &str, spec: &IndexSpec) -> AppResult<()>;

    /// Append one document.
    async fn insert(&self, name: &str, document: &IndexedDocument) -> AppResult<()>;

    /// Return at most `k` hits ordered by descending score.
    async fn search(&self, name: &str, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>>;

    /// Number of documents in the index.
    async fn count(&self, name: &str) -> AppResult<usize>;
}

/// Similarity score for `metric`; higher is closer.
///
/// Matches the scores OpenSearch reports for each space type.
pub fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::L2 => {
            let squared: f32 = a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum();
            1.0 / (1.0 + squared)
        }
        DistanceMetric::Cosine => (1.0 + cosine_similarity(a, b)) / 2.0,
        DistanceMetric::InnerProduct => {
            let dot = dot(a, b);
            if dot >= 0.0 {
                dot + 1.0
            } else {
                1.0 / (1.0 - dot)
            }
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot(a, b) / (norm_a * norm_b)
}

/// Sort hits nearest first and keep the top `k`.
pub fn rank_hits(mut hits: Vec<SearchHit>, k: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    hits.truncate(k);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_score() {
        assert!((score(DistanceMetric::L2, &[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        // squared distance 2 -> 1/3
        assert!((score(DistanceMetric::L2, &[1.0, 0.0], &[0.0, 1.0]) - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_score() {
        assert!((score(DistanceMetric::Cosine, &[2.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!((score(DistanceMetric::Cosine, &[1.0, 0.0], &[0.0, 1.0]) - 0.5).abs() < 1e-6);
        assert!(score(DistanceMetric::Cosine, &[1.0, 0.0], &[-1.0, 0.0]).abs() < 1e-6);
    }

    #[test]
    fn test_inner_product_score() {
        assert!((score(DistanceMetric::InnerProduct, &[1.0, 2.0], &[1.0, 1.0]) - 4.0).abs() < 1e-6);
        assert!((score(DistanceMetric::InnerProduct, &[1.0, 0.0], &[-1.0, 0.0]) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_rank_hits() {
        let hit = |text: &str, score: f32| SearchHit {
            id: None,
            chunk_text: text.to_string(),
            score,
        };
        let ranked = rank_hits(vec![hit("far", 0.1), hit("near", 0.9), hit("mid", 0.5)], 2);
        let texts: Vec<&str> = ranked.iter().map(|h| h.chunk_text.as_str()).collect();
        assert_eq!(texts, vec!["near", "mid"]);
    }

    #[test]
    fn test_spec_from_settings() {
        let spec = IndexSpec::from_settings(1536, &VectorStoreSettings::default());
        assert_eq!(spec.dimension, 1536);
        assert_eq!(spec.metric, DistanceMetric::L2);
        assert_eq!(spec.ann, AnnParams::default());
        assert!(IndexSpec::new(0, DistanceMetric::L2).validate().is_err());
    }
}
