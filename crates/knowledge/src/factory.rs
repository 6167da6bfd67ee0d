//! Wiring of gateways, indexes, and pipelines from the application config.

use crate::chunker::RecursiveChunker;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::index::SqliteIndex;
use crate::ingest::IngestionPipeline;
use crate::opensearch::OpenSearchIndex;
use crate::progress::ProgressReporter;
use crate::rag::{AnswerOptions, Answerer, GenerationGateway, LlmGenerationGateway};
use crate::vector_index::{IndexSpec, VectorIndex};
use docent_core::{AppConfig, AppError, AppResult};
use docent_llm::create_client;
use docent_prompt::load_prompt;
use std::sync::Arc;
use std::time::Duration;

/// Open the configured vector index backend.
///
/// # Errors
/// `AppError::Config` for an unknown backend, or an OpenSearch backend
/// without an endpoint.
pub fn create_index(config: &AppConfig) -> AppResult<Arc<dyn VectorIndex>> {
    let settings = &config.vector_store;

    match settings.backend.as_str() {
        "sqlite" => {
            config.ensure_state_dir()?;
            let path = config.sqlite_index_path();
            tracing::debug!("Opening embedded index at {:?}", path);
            Ok(Arc::new(SqliteIndex::open(&path)?))
        }
        "opensearch" => {
            let endpoint = settings.endpoint.as_deref().ok_or_else(|| {
                AppError::Config("vectorStore.endpoint is required for opensearch".to_string())
            })?;
            let username = AppConfig::resolve_secret(settings.username_env.as_deref())?;
            let password = AppConfig::resolve_secret(settings.password_env.as_deref())?;
            tracing::debug!("Using OpenSearch at {}", endpoint);
            Ok(Arc::new(OpenSearchIndex::new(
                endpoint,
                username,
                password,
                Duration::from_secs(settings.timeout_secs),
                settings.refresh,
            )?))
        }
        other => Err(AppError::Config(format!(
            "Unknown vector store backend: '{}'. Supported backends: sqlite, opensearch",
            other
        ))),
    }
}

pub fn create_embedder(config: &AppConfig) -> AppResult<Arc<dyn EmbeddingProvider>> {
    create_provider(&config.embedding, &config.retry)
}

/// Generation gateway using the configured client and prompt definition.
pub fn create_generator(config: &AppConfig) -> AppResult<Arc<dyn GenerationGateway>> {
    let client = create_client(&config.generation)?;
    let prompt = load_prompt(&config.workspace, &config.generation.prompt_id)?;
    Ok(Arc::new(LlmGenerationGateway::new(
        client,
        prompt,
        config.generation.clone(),
        config.retry.clone(),
    )))
}

/// Ingestion pipeline for the configured chunking, embedding, and index.
pub fn create_pipeline(config: &AppConfig, progress: ProgressReporter) -> AppResult<IngestionPipeline> {
    let chunker = RecursiveChunker::new(config.ingest.chunk_size, config.ingest.chunk_overlap)?;
    let embedder = create_embedder(config)?;
    let spec = IndexSpec::from_settings(embedder.dimensions(), &config.vector_store);
    let index = create_index(config)?;

    Ok(IngestionPipeline::new(chunker, embedder, index, spec).with_progress(progress))
}

/// Answerer for the configured gateways; `k` overrides `retrieval.topK`.
///
/// # Errors
/// `AppError::InvalidInput` when `k` is zero.
pub fn create_answerer(config: &AppConfig, k: Option<usize>) -> AppResult<Answerer> {
    let mut options = AnswerOptions::from_settings(&config.retrieval);
    if let Some(k) = k {
        if k == 0 {
            return Err(AppError::InvalidInput("-k must be greater than 0".to_string()));
        }
        options = options.with_k(k);
    }

    Ok(Answerer::new(
        create_embedder(config)?,
        create_index(config)?,
        create_generator(config)?,
        options,
    ))
}
