//! Error types for Docent.
//!
//! This module defines a unified error enum covering the retrieval pipeline's
//! failure taxonomy (invalid input, upstream failures, index errors) plus the
//! ambient categories (configuration, I/O, extraction, prompts).

use thiserror::Error;

/// Unified error type for Docent.
///
/// All fallible functions return `Result<T, AppError>`.
/// We never panic: errors must be represented and propagated.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Empty text, empty question, or out-of-range parameters
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Embedding or generation service unreachable or returned an error status
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream answered with an unexpected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Vector index (re)creation rejected
    #[error("Index creation error: {0}")]
    IndexCreation(String),

    /// Document insertion rejected
    #[error("Insert error: {0}")]
    Insert(String),

    /// Vector search failed in the backend
    #[error("Search error: {0}")]
    Search(String),

    /// Text extraction from a source document failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only upstream availability failures qualify; a malformed response or
    /// bad input will fail the same way again.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::UpstreamUnavailable(_))
    }

    /// Friendly, non-technical text to show an end user.
    ///
    /// Never equal to the "insufficient information" fallback.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "Please type a question so I can help you.",
            AppError::UpstreamUnavailable(_) | AppError::MalformedResponse(_) => {
                "Sorry, I'm having trouble reaching my assistant service right now. Please try again in a moment."
            }
            AppError::Search(_) | AppError::IndexCreation(_) | AppError::Insert(_) => {
                "Sorry, I couldn't search my documents right now. Please try again in a moment."
            }
            AppError::Config(_) => {
                "Sorry, I'm not set up correctly. Please contact the administrator."
            }
            _ => "Sorry, something went wrong while answering. Please try again.",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
