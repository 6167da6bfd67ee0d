//! Source document text extraction.

use docent_core::{AppError, AppResult};
use std::fs;
use std::path::Path;

/// Document types the ingestion pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Pdf,
    Markdown,
    PlainText,
    Unsupported,
}

impl ContentType {
    /// Detect content type from file extension.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => Self::Pdf,
            Some("md") | Some("markdown") => Self::Markdown,
            Some("txt") => Self::PlainText,
            _ => Self::Unsupported,
        }
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Markdown => "markdown",
            Self::PlainText => "text",
            Self::Unsupported => "unsupported",
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported)
    }
}

/// Pure function from a document path to its raw text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, path: &Path) -> AppResult<String>;
}

/// Extracts text from PDF, Markdown, and plain-text files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileTextExtractor;

impl TextExtractor for FileTextExtractor {
    fn extract(&self, path: &Path) -> AppResult<String> {
        match ContentType::from_path(path) {
            ContentType::Pdf => extract_pdf_text(path),
            ContentType::Markdown | ContentType::PlainText => fs::read_to_string(path)
                .map_err(|e| AppError::Extraction(format!("Failed to read {:?}: {}", path, e))),
            ContentType::Unsupported => Err(AppError::Extraction(format!(
                "Unsupported document type: {:?}",
                path
            ))),
        }
    }
}

/// Extract PDF text page by page; page breaks become line breaks.
///
/// The PDF library panics on some malformed files, so extraction runs under
/// `catch_unwind` and a panic is reported as an extraction error.
fn extract_pdf_text(path: &Path) -> AppResult<String> {
    let pages_result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        pdf_extract::extract_text_by_pages(path)
    }));

    let pages = match pages_result {
        Ok(Ok(pages)) => pages,
        Ok(Err(e)) => {
            return Err(AppError::Extraction(format!(
                "Failed to extract text from {:?}: {}",
                path, e
            )))
        }
        Err(panic_payload) => {
            let panic_msg = if let Some(s) = panic_payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = panic_payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            return Err(AppError::Extraction(format!(
                "PDF reader crashed on {:?}: {}",
                path, panic_msg
            )));
        }
    };

    tracing::debug!("Extracted {} pages from {:?}", pages.len(), path);

    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}
