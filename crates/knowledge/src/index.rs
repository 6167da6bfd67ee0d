//! SQLite-backed vector index.
//!
//! An embedded implementation of [`VectorIndex`] that keeps every named
//! index in one database file. Search is an exact scan scored with the same
//! formulas OpenSearch uses for each space type.

use crate::types::{IndexedDocument, SearchHit};
use crate::vector_index::{rank_hits, score, AnnParams, IndexSpec, VectorIndex};
use chrono::Utc;
use docent_core::{AppError, AppResult, DistanceMetric};
use rusqlite::types::Type;
use rusqlite::{params, Connection, Error, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Embedded vector index stored in SQLite.
pub struct SqliteIndex {
    conn: Mutex<Connection>,
}

impl SqliteIndex {
    /// Open (or create) the index database at `db_path`.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::IndexCreation(format!("Failed to create index directory: {}", e))
            })?;
        }

        let conn = Connection::open(db_path).map_err(|e| {
            AppError::IndexCreation(format!("Failed to open SQLite index {:?}: {}", db_path, e))
        })?;

        tracing::debug!("Opened SQLite index at {:?}", db_path);
        Self::with_connection(conn)
    }

    /// Create a throwaway in-memory index.
    pub fn in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| {
            AppError::IndexCreation(format!("Failed to open in-memory index: {}", e))
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> AppResult<Self> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS indexes (
                name TEXT PRIMARY KEY,
                dimension INTEGER NOT NULL,
                metric TEXT NOT NULL,
                ann TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
                id TEXT PRIMARY KEY,
                index_name TEXT NOT NULL,
                chunk_text TEXT NOT NULL,
                embedding BLOB NOT NULL,
                FOREIGN KEY (index_name) REFERENCES indexes(name)
            );

            CREATE INDEX IF NOT EXISTS idx_documents_index ON documents(index_name);
            "#,
        )
        .map_err(|e| AppError::IndexCreation(format!("Failed to create tables: {}", e)))?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| AppError::Other("SQLite index lock poisoned".to_string()))
    }
}

fn read_spec(conn: &Connection, name: &str) -> rusqlite::Result<Option<IndexSpec>> {
    conn.query_row(
        "SELECT dimension, metric, ann FROM indexes WHERE name = ?1",
        params![name],
        |row| {
            let dimension = row.get::<_, i64>(0)? as usize;
            let metric: String = row.get(1)?;
            let ann: String = row.get(2)?;

            let metric = DistanceMetric::parse(&metric).ok_or_else(|| {
                Error::FromSqlConversionFailure(1, Type::Text, format!("unknown metric '{}'", metric).into())
            })?;
            let ann = serde_json::from_str::<AnnParams>(&ann)
                .map_err(|e| Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))?;

            Ok(IndexSpec { dimension, metric, ann })
        },
    )
    .optional()
}

#[async_trait::async_trait]
impl VectorIndex for SqliteIndex {
    fn backend_name(&self) -> &str {
        "sqlite"
    }

    async fn create_index(&self, name: &str, spec: &IndexSpec) -> AppResult<()> {
        spec.validate()?;
        let ann = serde_json::to_string(&spec.ann)?;

        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| AppError::IndexCreation(format!("Failed to start transaction: {}", e)))?;

        let removed = tx
            .execute("DELETE FROM documents WHERE index_name = ?1", params![name])
            .map_err(|e| AppError::IndexCreation(format!("Failed to delete documents: {}", e)))?;
        tx.execute("DELETE FROM indexes WHERE name = ?1", params![name])
            .map_err(|e| AppError::IndexCreation(format!("Failed to delete index: {}", e)))?;
        tx.execute(
            "INSERT INTO indexes (name, dimension, metric, ann, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                name,
                spec.dimension as i64,
                spec.metric.as_str(),
                ann,
                Utc::now().to_rfc3339(),
            ],
        )
        .map_err(|e| AppError::IndexCreation(format!("Failed to create index: {}", e)))?;

        tx.commit()
            .map_err(|e| AppError::IndexCreation(format!("Failed to commit index creation: {}", e)))?;

        tracing::info!(
            "Created index '{}' (dimension {}, metric {}, replaced {} documents)",
            name,
            spec.dimension,
            spec.metric.as_str(),
            removed
        );
        Ok(())
    }

    async fn insert(&self, name: &str, document: &IndexedDocument) -> AppResult<()> {
        let conn = self.lock()?;

        let spec = read_spec(&conn, name)
            .map_err(|e| AppError::Insert(format!("Failed to read index spec: {}", e)))?
            .ok_or_else(|| AppError::Insert(format!("Index '{}' does not exist", name)))?;

        if document.embedding.len() != spec.dimension {
            return Err(AppError::Insert(format!(
                "dimension mismatch: index '{}' expects {}, got {}",
                name,
                spec.dimension,
                document.embedding.len()
            )));
        }

        conn.execute(
            "INSERT INTO documents (id, index_name, chunk_text, embedding) VALUES (?1, ?2, ?3, ?4)",
            params![
                uuid::Uuid::new_v4().to_string(),
                name,
                document.chunk_text,
                embedding_to_bytes(&document.embedding),
            ],
        )
        .map_err(|e| AppError::Insert(format!("Failed to insert document: {}", e)))?;

        Ok(())
    }

    async fn search(&self, name: &str, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let conn = self.lock()?;

        let Some(spec) = read_spec(&conn, name)
            .map_err(|e| AppError::Search(format!("Failed to read index spec: {}", e)))?
        else {
            tracing::debug!("Index '{}' does not exist; returning no hits", name);
            return Ok(Vec::new());
        };

        if query.len() != spec.dimension {
            return Err(AppError::Search(format!(
                "query dimension {} does not match index '{}' dimension {}",
                query.len(),
                name,
                spec.dimension
            )));
        }

        let mut stmt = conn
            .prepare("SELECT id, chunk_text, embedding FROM documents WHERE index_name = ?1")
            .map_err(|e| AppError::Search(format!("Failed to prepare query: {}", e)))?;

        let rows = stmt
            .query_map(params![name], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Vec<u8>>(2)?,
                ))
            })
            .map_err(|e| AppError::Search(format!("Failed to query documents: {}", e)))?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, chunk_text, bytes) =
                row.map_err(|e| AppError::Search(format!("Failed to read document: {}", e)))?;
            let embedding = bytes_to_embedding(&bytes)?;
            hits.push(SearchHit {
                id: Some(id),
                score: score(spec.metric, query, &embedding),
                chunk_text,
            });
        }

        let hits = rank_hits(hits, k);

        tracing::debug!("Retrieved {} hits from '{}' (requested top-{})", hits.len(), name, k);

        Ok(hits)
    }

    async fn count(&self, name: &str) -> AppResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE index_name = ?1",
                params![name],
                |row| row.get(0),
            )
            .map_err(|e| AppError::Search(format!("Failed to count documents: {}", e)))?;
        Ok(count as usize)
    }
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Search(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn spec(dimension: usize) -> IndexSpec {
        IndexSpec::new(dimension, DistanceMetric::L2)
    }

    fn stored_spec(index: &SqliteIndex, name: &str) -> rusqlite::Result<Option<IndexSpec>> {
        read_spec(&index.lock().unwrap(), name)
    }

    #[tokio::test]
    async fn test_create_insert_search() {
        let index = SqliteIndex::in_memory().unwrap();
        index.create_index("kb", &spec(3)).await.unwrap();

        index
            .insert("kb", &IndexedDocument::new("x axis", vec![1.0, 0.0, 0.0]))
            .await
            .unwrap();
        index
            .insert("kb", &IndexedDocument::new("y axis", vec![0.0, 1.0, 0.0]))
            .await
            .unwrap();
        index
            .insert("kb", &IndexedDocument::new("mostly x", vec![0.9, 0.1, 0.0]))
            .await
            .unwrap();

        let hits = index.search("kb", &[1.0, 0.0, 0.0], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk_text, "x axis");
        assert_eq!(hits[1].chunk_text, "mostly x");
        assert!(hits[0].score >= hits[1].score);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert_eq!(index.count("kb").await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_corrupted_spec_is_an_error() {
        let index = SqliteIndex::in_memory().unwrap();
        index.create_index("kb", &spec(2)).await.unwrap();
        index
            .insert("kb", &IndexedDocument::new("kept", vec![1.0, 0.0]))
            .await
            .unwrap();

        index
            .lock()
            .unwrap()
            .execute("UPDATE indexes SET metric = 'manhattan' WHERE name = 'kb'", [])
            .unwrap();
        assert!(matches!(
            stored_spec(&index, "kb"),
            Err(Error::FromSqlConversionFailure(1, Type::Text, _))
        ));
        assert!(matches!(
            index.search("kb", &[1.0, 0.0], 1).await,
            Err(AppError::Search(_))
        ));
        assert!(matches!(
            index.insert("kb", &IndexedDocument::new("new", vec![0.0, 1.0])).await,
            Err(AppError::Insert(_))
        ));

        index
            .lock()
            .unwrap()
            .execute("UPDATE indexes SET metric = 'l2', ann = 'not json' WHERE name = 'kb'", [])
            .unwrap();
        assert!(matches!(
            index.search("kb", &[1.0, 0.0], 1).await,
            Err(AppError::Search(_))
        ));
    }

    #[tokio::test]
    async fn test_recreate_replaces_content() {
        let index = SqliteIndex::in_memory().unwrap();
        index.create_index("kb", &spec(2)).await.unwrap();
        index
            .insert("kb", &IndexedDocument::new("old", vec![1.0, 0.0]))
            .await
            .unwrap();

        index.create_index("kb", &spec(4)).await.unwrap();
        assert_eq!(index.count("kb").await.unwrap(), 0);
        assert_eq!(stored_spec(&index, "kb").unwrap().unwrap().dimension, 4);
    }

    #[tokio::test]
    async fn test_insert_rejects_dimension_mismatch() {
        let index = SqliteIndex::in_memory().unwrap();
        index.create_index("kb", &spec(3)).await.unwrap();

        let err = index
            .insert("kb", &IndexedDocument::new("short", vec![1.0, 0.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Insert(_)));
        assert_eq!(index.count("kb").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_insert_into_missing_index() {
        let index = SqliteIndex::in_memory().unwrap();
        let err = index
            .insert("nope", &IndexedDocument::new("text", vec![1.0]))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Insert(_)));
    }

    #[tokio::test]
    async fn test_zero_dimension_is_rejected() {
        let index = SqliteIndex::in_memory().unwrap();
        let err = index.create_index("kb", &spec(0)).await.unwrap_err();
        assert!(matches!(err, AppError::IndexCreation(_)));
    }

    #[tokio::test]
    async fn test_search_absent_empty_and_zero_k() {
        let index = SqliteIndex::in_memory().unwrap();
        assert!(index.search("missing", &[1.0], 3).await.unwrap().is_empty());
        assert_eq!(index.count("missing").await.unwrap(), 0);

        index.create_index("kb", &spec(1)).await.unwrap();
        assert!(index.search("kb", &[1.0], 3).await.unwrap().is_empty());

        index
            .insert("kb", &IndexedDocument::new("one", vec![1.0]))
            .await
            .unwrap();
        assert!(index.search("kb", &[1.0], 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_indexes_are_isolated() {
        let index = SqliteIndex::in_memory().unwrap();
        index.create_index("airline", &spec(1)).await.unwrap();
        index.create_index("coffee", &spec(1)).await.unwrap();
        index
            .insert("airline", &IndexedDocument::new("flights", vec![1.0]))
            .await
            .unwrap();

        assert_eq!(index.count("airline").await.unwrap(), 1);
        assert_eq!(index.count("coffee").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(".docent").join("index.sqlite");

        {
            let index = SqliteIndex::open(&path).unwrap();
            let cosine = IndexSpec::new(2, DistanceMetric::Cosine);
            index.create_index("kb", &cosine).await.unwrap();
            index
                .insert("kb", &IndexedDocument::new("kept", vec![0.0, 1.0]))
                .await
                .unwrap();
        }

        let index = SqliteIndex::open(&path).unwrap();
        assert_eq!(stored_spec(&index, "kb").unwrap().unwrap().metric, DistanceMetric::Cosine);
        let hits = index.search("kb", &[0.0, 2.0], 1).await.unwrap();
        assert_eq!(hits[0].chunk_text, "kept");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_embedding_bytes_round_trip() {
        let embedding = vec![0.25, -1.5, 3.0];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&embedding)).unwrap(), embedding);
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }
}
