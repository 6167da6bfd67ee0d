//! Docent knowledge engine.
//!
//! Document chunking, embeddings, vector indexes (embedded SQLite or
//! OpenSearch), the ingestion pipeline, and retrieval-augmented answering.

pub mod chunker;
pub mod embeddings;
pub mod factory;
pub mod index;
pub mod ingest;
pub mod opensearch;
pub mod parser;
pub mod progress;
pub mod rag;
pub mod types;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunker::{split, RecursiveChunker};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use factory::{create_answerer, create_embedder, create_generator, create_index, create_pipeline};
pub use index::SqliteIndex;
pub use ingest::{expand_documents, IngestionPipeline};
pub use opensearch::OpenSearchIndex;
pub use parser::{ContentType, FileTextExtractor, TextExtractor};
pub use progress::{Phase, ProgressCallback, ProgressEvent, ProgressReporter};
pub use rag::{Answer, AnswerOptions, Answerer, ConversationLog, GenerationGateway, Outcome};
pub use types::{Chunk, DocumentOutcome, DocumentReport, IndexedDocument, IngestionReport, SearchHit};
pub use vector_index::{AnnParams, IndexSpec, VectorIndex};
