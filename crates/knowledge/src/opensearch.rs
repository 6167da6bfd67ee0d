//! OpenSearch k-NN vector index over REST.
//!
//! Endpoints used:
//! - `HEAD /{index}`, `DELETE /{index}`, `PUT /{index}` for (re)creation
//! - `POST /{index}/_doc` for inserts
//! - `POST /{index}/_search` with a `knn` query
//! - `GET /{index}/_count`

use crate::types::{IndexedDocument, SearchHit};
use crate::vector_index::{rank_hits, IndexSpec, VectorIndex};
use docent_core::{AppError, AppResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::instrument;

/// Vector index backed by an OpenSearch cluster.
pub struct OpenSearchIndex {
    client: Client,
    endpoint: String,
    username: Option<String>,
    password: Option<String>,
    refresh: bool,
    /// Dimensions of indexes known to exist, when this client created them
    known: Mutex<HashMap<String, Option<usize>>>,
}

impl OpenSearchIndex {
    /// Create a client for the cluster at `endpoint`.
    ///
    /// # Arguments
    /// * `endpoint` - Cluster URL (e.g. "https://search.example.com:443")
    /// * `username` / `password` - Optional basic-auth credentials
    /// * `timeout` - Per-request timeout
    /// * `refresh` - Make each insert visible to search before returning
    pub fn new(
        endpoint: impl Into<String>,
        username: Option<String>,
        password: Option<String>,
        timeout: Duration,
        refresh: bool,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Config(format!("Failed to create HTTP client for OpenSearch: {}", e))
        })?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            username,
            password,
            refresh,
            known: Mutex::new(HashMap::new()),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}/{}", self.endpoint, path));
        match self.username {
            Some(ref user) => builder.basic_auth(user, self.password.as_ref()),
            None => builder,
        }
    }

    fn remember(&self, name: &str, dimension: Option<usize>) {
        if let Ok(mut known) = self.known.lock() {
            known.insert(name.to_string(), dimension);
        }
    }

    fn known_dimension(&self, name: &str) -> Option<Option<usize>> {
        self.known.lock().ok().and_then(|known| known.get(name).copied())
    }

    async fn exists(&self, name: &str) -> Result<bool, String> {
        let response = self
            .request(Method::HEAD, name)
            .send()
            .await
            .map_err(|e| format!("Failed to reach OpenSearch: {}", e))?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(format!("Unexpected status {} checking index '{}'", status, name)),
        }
    }
}

/// Body of the `PUT /{index}` request.
pub(crate) fn create_index_body(spec: &IndexSpec) -> Value {
    json!({
        "settings": {
            "index": {
                "knn": true,
                "knn.algo_param.ef_search": spec.ann.ef_search
            }
        },
        "mappings": {
            "properties": {
                "chunk_text": { "type": "text" },
                "embedding": {
                    "type": "knn_vector",
                    "dimension": spec.dimension,
                    "method": {
                        "name": "hnsw",
                        "space_type": spec.metric.space_type(),
                        "engine": spec.ann.engine,
                        "parameters": {
                            "ef_construction": spec.ann.ef_construction,
                            "m": spec.ann.m
                        }
                    }
                }
            }
        }
    })
}

fn insert_body(document: &IndexedDocument) -> Value {
    json!({
        "chunk_text": document.chunk_text,
        "embedding": document.embedding
    })
}

fn search_body(query: &[f32], k: usize) -> Value {
    json!({
        "size": k,
        "query": {
            "knn": {
                "embedding": {
                    "vector": query,
                    "k": k
                }
            }
        }
    })
}

/// Extract hits from a `_search` response.
fn parse_hits(body: &Value) -> AppResult<Vec<SearchHit>> {
    let hits = body
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Search("Search response has no hits.hits array".to_string()))?;

    hits.iter()
        .map(|hit| {
            let chunk_text = hit
                .pointer("/_source/chunk_text")
                .and_then(Value::as_str)
                .ok_or_else(|| AppError::Search("Search hit has no _source.chunk_text".to_string()))?;
            Ok(SearchHit {
                id: hit.get("_id").and_then(Value::as_str).map(str::to_string),
                chunk_text: chunk_text.to_string(),
                score: hit.get("_score").and_then(Value::as_f64).unwrap_or(0.0) as f32,
            })
        })
        .collect()
}

fn parse_count(body: &Value) -> AppResult<usize> {
    body.get("count")
        .and_then(Value::as_u64)
        .map(|count| count as usize)
        .ok_or_else(|| AppError::Search("Count response has no count field".to_string()))
}

async fn error_text(response: reqwest::Response) -> String {
    let status = response.status();
    let text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    format!("({}) {}", status, text)
}

#[async_trait::async_trait]
impl VectorIndex for OpenSearchIndex {
    fn backend_name(&self) -> &str {
        "opensearch"
    }

    #[instrument(skip(self, spec), fields(dimension = spec.dimension))]
    async fn create_index(&self, name: &str, spec: &IndexSpec) -> AppResult<()> {
        spec.validate()?;

        if self.exists(name).await.map_err(AppError::IndexCreation)? {
            tracing::info!("Deleting existing index '{}'", name);
            let response = self
                .request(Method::DELETE, name)
                .send()
                .await
                .map_err(|e| AppError::IndexCreation(format!("Failed to delete index: {}", e)))?;
            if !response.status().is_success() {
                return Err(AppError::IndexCreation(format!(
                    "Failed to delete index '{}': {}",
                    name,
                    error_text(response).await
                )));
            }
        }

        let response = self
            .request(Method::PUT, name)
            .json(&create_index_body(spec))
            .send()
            .await
            .map_err(|e| AppError::IndexCreation(format!("Failed to create index: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::IndexCreation(format!(
                "OpenSearch rejected index '{}': {}",
                name,
                error_text(response).await
            )));
        }

        self.remember(name, Some(spec.dimension));
        tracing::info!("Created index '{}' (dimension {})", name, spec.dimension);
        Ok(())
    }

    async fn insert(&self, name: &str, document: &IndexedDocument) -> AppResult<()> {
        match self.known_dimension(name) {
            Some(Some(dimension)) if dimension != document.embedding.len() => {
                return Err(AppError::Insert(format!(
                    "dimension mismatch: index '{}' expects {}, got {}",
                    name,
                    dimension,
                    document.embedding.len()
                )));
            }
            Some(_) => {}
            None => {
                // Posting to a missing index would auto-create it with a dynamic mapping
                if !self.exists(name).await.map_err(AppError::Insert)? {
                    return Err(AppError::Insert(format!("Index '{}' does not exist", name)));
                }
                self.remember(name, None);
            }
        }

        let path = if self.refresh {
            format!("{}/_doc?refresh=true", name)
        } else {
            format!("{}/_doc", name)
        };

        let response = self
            .request(Method::POST, &path)
            .json(&insert_body(document))
            .send()
            .await
            .map_err(|e| AppError::Insert(format!("Failed to insert document: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Insert(format!(
                "OpenSearch rejected document: {}",
                error_text(response).await
            )));
        }

        Ok(())
    }

    #[instrument(skip(self, query), fields(k = k))]
    async fn search(&self, name: &str, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let response = self
            .request(Method::POST, &format!("{}/_search", name))
            .json(&search_body(query, k))
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to reach OpenSearch: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            tracing::debug!("Index '{}' does not exist; returning no hits", name);
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(AppError::Search(format!(
                "Search failed: {}",
                error_text(response).await
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse search response: {}", e)))?;

        let hits = rank_hits(parse_hits(&body)?, k);
        tracing::debug!("Retrieved {} hits from '{}'", hits.len(), name);
        Ok(hits)
    }

    async fn count(&self, name: &str) -> AppResult<usize> {
        let response = self
            .request(Method::GET, &format!("{}/_count", name))
            .send()
            .await
            .map_err(|e| AppError::Search(format!("Failed to reach OpenSearch: {}", e)))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(0);
        }
        if !response.status().is_success() {
            return Err(AppError::Search(format!(
                "Count failed: {}",
                error_text(response).await
            )));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AppError::Search(format!("Failed to parse count response: {}", e)))?;
        parse_count(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docent_core::DistanceMetric;

    fn unreachable() -> OpenSearchIndex {
        OpenSearchIndex::new("http://127.0.0.1:9/", None, None, Duration::from_secs(1), false)
            .unwrap()
    }

    #[test]
    fn test_create_index_body() {
        let body = create_index_body(&IndexSpec::new(1536, DistanceMetric::L2));
        assert_eq!(
            body,
            json!({
                "settings": {"index": {"knn": true, "knn.algo_param.ef_search": 100}},
                "mappings": {"properties": {
                    "chunk_text": {"type": "text"},
                    "embedding": {
                        "type": "knn_vector",
                        "dimension": 1536,
                        "method": {
                            "name": "hnsw",
                            "space_type": "l2",
                            "engine": "nmslib",
                            "parameters": {"ef_construction": 256, "m": 48}
                        }
                    }
                }}
            })
        );
    }

    #[test]
    fn test_space_type_follows_metric() {
        let body = create_index_body(&IndexSpec::new(8, DistanceMetric::Cosine));
        assert_eq!(
            body.pointer("/mappings/properties/embedding/method/space_type"),
            Some(&json!("cosinesimil"))
        );
    }

    #[test]
    fn test_insert_and_search_bodies() {
        let doc = IndexedDocument::new("Bags: 23kg", vec![0.5, 0.25]);
        assert_eq!(insert_body(&doc), json!({"chunk_text": "Bags: 23kg", "embedding": [0.5, 0.25]}));

        assert_eq!(
            search_body(&[0.5, 0.25], 3),
            json!({"size": 3, "query": {"knn": {"embedding": {"vector": [0.5, 0.25], "k": 3}}}})
        );
    }

    #[test]
    fn test_parse_hits() {
        let body = json!({
            "took": 3,
            "hits": {
                "total": {"value": 2},
                "hits": [
                    {"_id": "a1", "_score": 0.91, "_source": {"chunk_text": "Baggage allowance is 23kg per checked bag."}},
                    {"_id": "b2", "_score": 0.42, "_source": {"chunk_text": "Pets travel in the cabin."}}
                ]
            }
        });
        let hits = parse_hits(&body).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id.as_deref(), Some("a1"));
        assert_eq!(hits[0].chunk_text, "Baggage allowance is 23kg per checked bag.");
        assert!((hits[0].score - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_parse_hits_malformed() {
        assert!(matches!(parse_hits(&json!({"error": "boom"})), Err(AppError::Search(_))));
        let missing_source = json!({"hits": {"hits": [{"_id": "a", "_score": 1.0}]}});
        assert!(matches!(parse_hits(&missing_source), Err(AppError::Search(_))));
        assert!(parse_hits(&json!({"hits": {"hits": []}})).unwrap().is_empty());
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(&json!({"count": 42, "_shards": {}})).unwrap(), 42);
        assert!(parse_count(&json!({})).is_err());
    }

    #[tokio::test]
    async fn test_unreachable_cluster_errors() {
        let index = unreachable();
        assert!(matches!(
            index.search("kb", &[1.0], 3).await,
            Err(AppError::Search(_))
        ));
        assert!(matches!(
            index.create_index("kb", &IndexSpec::new(1, DistanceMetric::L2)).await,
            Err(AppError::IndexCreation(_))
        ));
        assert!(index.search("kb", &[1.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_known_dimension_mismatch_is_rejected_locally() {
        let index = unreachable();
        index.remember("kb", Some(3));
        let err = index
            .insert("kb", &IndexedDocument::new("text", vec![1.0]))
            .await
            .unwrap_err();
        match err {
            AppError::Insert(msg) => assert!(msg.contains("dimension mismatch")),
            other => panic!("Expected insert error, got {:?}", other),
        }
    }
}
