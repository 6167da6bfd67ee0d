//! Retrieval-augmented answering.
//!
//! Each question moves through `Received -> Embedded -> Retrieved ->
//! {Grounded, Ungrounded} -> Answered`. The answerer keeps no state between
//! questions.

use crate::embeddings::EmbeddingProvider;
use crate::rag::generate::GenerationGateway;
use crate::rag::types::{Answer, Outcome};
use crate::types::SearchHit;
use crate::vector_index::VectorIndex;
use docent_core::config::{RetrievalSettings, DEFAULT_FALLBACK_MESSAGE};
use docent_core::{AppError, AppResult};
use std::sync::Arc;
use tracing::instrument;

/// Stages of answering one question, logged at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStage {
    Received,
    Embedded,
    Retrieved,
    Grounded,
    Ungrounded,
    Answered,
}

/// Retrieval and context-assembly parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerOptions {
    /// Number of hits requested from the index
    pub k: usize,
    /// Placed between chunk texts in the context
    pub separator: String,
    /// Returned verbatim when nothing is retrieved
    pub fallback_message: String,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            k: 3,
            separator: "\n\n---\n\n".to_string(),
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl AnswerOptions {
    pub fn from_settings(settings: &RetrievalSettings) -> Self {
        Self {
            k: settings.top_k,
            separator: settings.separator.clone(),
            fallback_message: settings.fallback_message.clone(),
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }
}

/// Answers questions from a knowledge base.
pub struct Answerer {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn GenerationGateway>,
    options: AnswerOptions,
}

impl Answerer {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn GenerationGateway>,
        options: AnswerOptions,
    ) -> Self {
        Self {
            embedder,
            index,
            generator,
            options,
        }
    }

    pub fn options(&self) -> &AnswerOptions {
        &self.options
    }

    /// Answer `question` from `index_name` in the voice of `persona`.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty question
    /// - Embedding and generation failures are returned as-is
    ///
    /// A search failure is logged and treated as an empty retrieval.
    #[instrument(skip(self, question, persona), fields(k = self.options.k))]
    pub async fn answer(&self, question: &str, index_name: &str, persona: &str) -> AppResult<Answer> {
        stage(QueryStage::Received);
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::InvalidInput("Question must not be empty".to_string()));
        }

        let embedding = self.embedder.embed(question).await?;
        stage(QueryStage::Embedded);

        let (retrieved, search_error) = match self.index.search(index_name, &embedding, self.options.k).await {
            Ok(hits) => (hits, None),
            Err(e) => {
                tracing::error!("Search in '{}' failed, answering without context: {}", index_name, e);
                (Vec::new(), Some(e.to_string()))
            }
        };
        stage(QueryStage::Retrieved);

        if retrieved.is_empty() {
            stage(QueryStage::Ungrounded);
            tracing::info!("No context retrieved from '{}'; returning fallback", index_name);
            stage(QueryStage::Answered);
            return Ok(Answer {
                text: self.options.fallback_message.clone(),
                outcome: Outcome::Ungrounded,
                retrieved,
                search_error,
            });
        }

        stage(QueryStage::Grounded);
        tracing::info!(
            "Retrieved {} chunks from '{}' (top score: {:.3})",
            retrieved.len(),
            index_name,
            retrieved[0].score
        );

        let context = assemble_context(&retrieved, &self.options.separator);
        let text = self.generator.generate(question, &context, persona).await?;
        stage(QueryStage::Answered);

        Ok(Answer {
            text,
            outcome: Outcome::Grounded,
            retrieved,
            search_error,
        })
    }
}

fn stage(stage: QueryStage) {
    tracing::debug!(stage = ?stage, "Query stage");
}

/// Join hit texts nearest first with `separator`.
pub fn assemble_context(hits: &[SearchHit], separator: &str) -> String {
    hits.iter()
        .map(|hit| hit.chunk_text.as_str())
        .collect::<Vec<_>>()
        .join(separator)
}
