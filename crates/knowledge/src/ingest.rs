//! Ingestion pipeline: extract -> chunk -> embed -> insert.
//!
//! The index is recreated once at the start of every run, so re-running
//! ingestion replaces the index content. Per-document and per-chunk failures
//! are logged and skipped; only index creation is fatal.

use crate::chunker::RecursiveChunker;
use crate::embeddings::EmbeddingProvider;
use crate::parser::{ContentType, FileTextExtractor, TextExtractor};
use crate::progress::ProgressReporter;
use crate::types::{DocumentOutcome, IndexedDocument, IngestionReport};
use crate::vector_index::{IndexSpec, VectorIndex};
use docent_core::{AppError, AppResult};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use walkdir::WalkDir;

/// Orchestrates chunking, embedding, and indexing for a corpus.
pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    chunker: RecursiveChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    spec: IndexSpec,
    progress: ProgressReporter,
}

impl IngestionPipeline {
    /// Create a pipeline writing to `index` with the declared `spec`.
    ///
    /// Documents are read with [`FileTextExtractor`] unless replaced with
    /// [`IngestionPipeline::with_extractor`].
    pub fn new(
        chunker: RecursiveChunker,
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        spec: IndexSpec,
    ) -> Self {
        Self {
            extractor: Arc::new(FileTextExtractor),
            chunker,
            embedder,
            index,
            spec,
            progress: ProgressReporter::noop(),
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_progress(mut self, progress: ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    /// Ingest `documents` into `index_name`, replacing its content.
    ///
    /// Directories are expanded to the supported files they contain.
    ///
    /// # Errors
    /// Only a failure to (re)create the index aborts the run.
    pub async fn ingest(&self, documents: &[PathBuf], index_name: &str) -> AppResult<IngestionReport> {
        let start = Instant::now();
        let mut report = IngestionReport::new(index_name);

        let documents = expand_documents(documents);
        tracing::info!(
            "Ingesting {} documents into '{}' ({} backend)",
            documents.len(),
            index_name,
            self.index.backend_name()
        );

        self.index.create_index(index_name, &self.spec).await?;

        let total = documents.len() as u64;
        for (position, path) in documents.into_iter().enumerate() {
            let outcome = self.ingest_document(&path, index_name, position as u64 + 1, total).await;
            if let DocumentOutcome::Skipped { ref reason } = outcome {
                tracing::warn!("Skipping {:?}: {}", path, reason);
            }
            report.record(path, outcome);
        }

        report.elapsed_secs = start.elapsed().as_secs_f64();
        tracing::info!(
            "Ingestion into '{}' completed: {} documents ingested, {} skipped, {}/{} chunks indexed in {:.2}s",
            index_name,
            report.documents_ingested,
            report.documents_skipped,
            report.chunks_indexed,
            report.chunks_produced,
            report.elapsed_secs
        );

        Ok(report)
    }

    async fn ingest_document(&self, path: &Path, index_name: &str, position: u64, total: u64) -> DocumentOutcome {
        if !path.exists() {
            return skipped("document not found");
        }

        let text = match self.extract(path).await {
            Ok(text) => text,
            Err(e) => return skipped(e.to_string()),
        };
        if text.trim().is_empty() {
            return skipped("no extractable text");
        }

        let name = path.display().to_string();
        self.progress.extract(position, total, &name, text.chars().count());

        let chunks = self.chunker.split_document(&text, Some(&name));
        self.progress.chunk(position, total, &name, chunks.len());

        let chunk_total = chunks.len() as u64;
        let mut indexed = 0;
        let mut failed = 0;

        for chunk in &chunks {
            let embedding = match self.embedder.embed(&chunk.text).await {
                Ok(embedding) => embedding,
                Err(e) => {
                    tracing::warn!(
                        "Failed to embed chunk {} of {:?}: {}",
                        chunk.sequence_index,
                        path,
                        e
                    );
                    failed += 1;
                    continue;
                }
            };
            self.progress
                .embed(chunk.sequence_index as u64 + 1, chunk_total, self.embedder.model_name());

            let document = IndexedDocument::new(chunk.text.clone(), embedding);
            match self.index.insert(index_name, &document).await {
                Ok(()) => indexed += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to index chunk {} of {:?}: {}",
                        chunk.sequence_index,
                        path,
                        e
                    );
                    failed += 1;
                }
            }
        }

        self.progress.index(indexed as u64, chunk_total, index_name);
        tracing::debug!("Processed {:?}: {} chunks, {} indexed, {} failed", path, chunks.len(), indexed, failed);

        DocumentOutcome::Ingested {
            chunks: chunks.len(),
            indexed,
            failed,
        }
    }

    /// Extraction is blocking (PDF parsing), so it runs off the async workers.
    async fn extract(&self, path: &Path) -> AppResult<String> {
        let extractor = self.extractor.clone();
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || extractor.extract(&path))
            .await
            .map_err(|e| AppError::Extraction(format!("Extraction task failed: {}", e)))?
    }
}

fn skipped(reason: impl Into<String>) -> DocumentOutcome {
    DocumentOutcome::Skipped {
        reason: reason.into(),
    }
}

/// Expand directories into the supported documents they contain.
///
/// Files inside a directory are returned in sorted path order; explicit file
/// arguments (including missing ones) are kept as given so they show up in
/// the report.
pub fn expand_documents(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut documents = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path())
                .filter(|p| ContentType::from_path(p).is_supported())
                .collect();
            found.sort();
            tracing::debug!("Found {} documents under {:?}", found.len(), path);
            documents.extend(found);
        } else {
            documents.push(path.clone());
        }
    }

    documents
}
