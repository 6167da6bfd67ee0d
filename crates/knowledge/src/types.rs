//! Core types for the knowledge base.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A bounded-length passage of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Passage text (trimmed, never empty)
    pub text: String,

    /// Identifier of the document the chunk came from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_document: Option<String>,

    /// Position among the kept chunks of the document
    pub sequence_index: usize,
}

/// A chunk stored in a vector index alongside its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub chunk_text: String,
    pub embedding: Vec<f32>,
}

impl IndexedDocument {
    pub fn new(chunk_text: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            chunk_text: chunk_text.into(),
            embedding,
        }
    }
}

/// One k-NN search hit. Higher scores are closer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Backend document identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub chunk_text: String,

    pub score: f32,
}

/// Outcome of ingesting one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    /// Text was extracted and chunked; some chunks may still have failed
    Ingested {
        chunks: usize,
        indexed: usize,
        failed: usize,
    },
    /// The document contributed nothing
    Skipped { reason: String },
}

/// Per-document ingestion report line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReport {
    pub path: PathBuf,

    #[serde(flatten)]
    pub outcome: DocumentOutcome,
}

/// Summary of one ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionReport {
    pub index_name: String,
    pub started_at: DateTime<Utc>,
    pub documents: Vec<DocumentReport>,
    pub documents_ingested: usize,
    pub documents_skipped: usize,
    pub chunks_produced: usize,
    pub chunks_indexed: usize,
    pub chunks_failed: usize,
    pub elapsed_secs: f64,
}

impl IngestionReport {
    /// Start an empty report for `index_name`.
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            started_at: Utc::now(),
            documents: Vec::new(),
            documents_ingested: 0,
            documents_skipped: 0,
            chunks_produced: 0,
            chunks_indexed: 0,
            chunks_failed: 0,
            elapsed_secs: 0.0,
        }
    }

    /// Record a document outcome and update the totals.
    pub fn record(&mut self, path: PathBuf, outcome: DocumentOutcome) {
        match &outcome {
            DocumentOutcome::Ingested {
                chunks,
                indexed,
                failed,
            } => {
                self.documents_ingested += 1;
                self.chunks_produced += chunks;
                self.chunks_indexed += indexed;
                self.chunks_failed += failed;
            }
            DocumentOutcome::Skipped { .. } => self.documents_skipped += 1,
        }
        self.documents.push(DocumentReport { path, outcome });
    }
}
