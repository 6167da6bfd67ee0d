//! Recursive-separator text chunking with configurable size and overlap.
//!
//! Text is split on the coarsest separator it contains (paragraphs, then
//! lines, then words, then graphemes). Pieces shorter than the chunk size are
//! greedily merged back together; longer pieces are split again with the next
//! separator. Lengths are measured in `char`s.

use crate::types::Chunk;
use docent_core::{AppError, AppResult};
use std::collections::VecDeque;
use unicode_segmentation::UnicodeSegmentation;

/// Separators tried in order. The empty separator splits into graphemes.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits documents into overlapping, bounded-length chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveChunker {
    /// Create a chunker.
    ///
    /// # Errors
    /// `AppError::InvalidInput` unless `chunk_size > 0` and `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> AppResult<Self> {
        if chunk_size == 0 {
            return Err(AppError::InvalidInput(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(AppError::InvalidInput(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split a document into chunks tagged with `source_document`.
    pub fn split_document(&self, text: &str, source_document: Option<&str>) -> Vec<Chunk> {
        let chunks: Vec<Chunk> = self
            .split_text(text)
            .into_iter()
            .enumerate()
            .map(|(sequence_index, text)| Chunk {
                text,
                source_document: source_document.map(str::to_string),
                sequence_index,
            })
            .collect();

        tracing::debug!(
            "Chunked text into {} chunks (size: {}, overlap: {})",
            chunks.len(),
            self.chunk_size,
            self.chunk_overlap
        );

        chunks
    }

    /// Split text into trimmed, non-empty chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &SEPARATORS)
            .into_iter()
            .map(|chunk| chunk.trim().to_string())
            .filter(|chunk| !chunk.is_empty())
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);

        let mut final_chunks = Vec::new();
        let mut short_pieces: Vec<&str> = Vec::new();

        for piece in split_on(text, separator) {
            if char_len(piece) < self.chunk_size {
                short_pieces.push(piece);
                continue;
            }

            if !short_pieces.is_empty() {
                final_chunks.extend(self.merge_pieces(&short_pieces, separator));
                short_pieces.clear();
            }

            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !short_pieces.is_empty() {
            final_chunks.extend(self.merge_pieces(&short_pieces, separator));
        }

        final_chunks
    }

    /// Greedily join pieces up to the chunk size, carrying whole trailing
    /// pieces (at most `chunk_overlap` chars) into the next chunk.
    fn merge_pieces(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let separator_len = char_len(separator);
        let joined_len = |current: &VecDeque<&str>, total: usize, len: usize| {
            total + len + if current.is_empty() { 0 } else { separator_len }
        };

        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if joined_len(&current, total, len) > self.chunk_size {
                if total > self.chunk_size {
                    tracing::warn!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total,
                        self.chunk_size
                    );
                }

                if !current.is_empty() {
                    push_joined(&mut chunks, &current, separator);

                    while total > self.chunk_overlap
                        || (joined_len(&current, total, len) > self.chunk_size && total > 0)
                    {
                        let Some(first) = current.pop_front() else {
                            break;
                        };
                        let dropped = char_len(first) + if current.is_empty() { 0 } else { separator_len };
                        total = total.saturating_sub(dropped);
                    }
                }
            }

            current.push_back(piece);
            total += len + if current.len() > 1 { separator_len } else { 0 };
        }

        push_joined(&mut chunks, &current, separator);
        chunks
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
        }
    }
}

/// Split `full_text` into overlapping chunks.
///
/// # Arguments
/// * `full_text` - Raw extracted document text
/// * `chunk_size` - Maximum chunk length in characters
/// * `chunk_overlap` - Characters shared by consecutive chunks
pub fn split(full_text: &str, chunk_size: usize, chunk_overlap: usize) -> AppResult<Vec<Chunk>> {
    Ok(RecursiveChunker::new(chunk_size, chunk_overlap)?.split_document(full_text, None))
}

fn pick_separator<'a, 's>(text: &str, separators: &'s [&'a str]) -> (&'a str, &'s [&'a str]) {
    for (i, &separator) in separators.iter().enumerate() {
        if separator.is_empty() || text.contains(separator) {
            return (separator, &separators[i + 1..]);
        }
    }
    (separators.last().copied().unwrap_or(""), &[])
}

fn split_on<'t>(text: &'t str, separator: &str) -> Vec<&'t str> {
    if separator.is_empty() {
        text.graphemes(true).collect()
    } else {
        text.split(separator).filter(|s| !s.is_empty()).collect()
    }
}

fn push_joined(chunks: &mut Vec<String>, pieces: &VecDeque<&str>, separator: &str) {
    let joined = pieces.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        chunks.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(split("text", 0, 0), Err(AppError::InvalidInput(_))));
        assert!(matches!(split("text", 100, 100), Err(AppError::InvalidInput(_))));
        assert!(matches!(split("text", 100, 150), Err(AppError::InvalidInput(_))));
        assert!(split("text", 100, 99).is_ok());
    }

    #[test]
    fn test_single_paragraph_is_one_chunk() {
        let paragraph = "  SkyConnect Airlines allows one checked bag of 23kg on all international routes. \
Carry-on baggage must not exceed 7kg and must fit in the overhead bin.\n";
        let chunks = split(paragraph, 1000, 150).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, paragraph.trim());
        assert_eq!(chunks[0].sequence_index, 0);
    }

    #[test]
    fn test_empty_and_whitespace_text() {
        assert!(split("", 100, 10).unwrap().is_empty());
        assert!(split(" \n\n \t\n ", 100, 10).unwrap().is_empty());
    }

    #[test]
    fn test_paragraphs_are_merged_greedily() {
        let text = "para one.\n\npara two.\n\npara three.";
        let chunks = RecursiveChunker::new(25, 0).unwrap().split_text(text);
        assert_eq!(chunks, vec!["para one.\n\npara two.", "para three."]);
    }

    #[test]
    fn test_whole_pieces_carry_over_as_overlap() {
        let text = "para one.\n\npara two.\n\npara three.";
        let chunks = RecursiveChunker::new(25, 10).unwrap().split_text(text);
        assert_eq!(chunks, vec!["para one.\n\npara two.", "para two.\n\npara three."]);
    }

    #[test]
    fn test_grapheme_level_overlap_is_exact() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(4);
        let chunks = RecursiveChunker::new(20, 5).unwrap().split_text(&text);

        assert!(chunks.len() > 2);
        for pair in chunks.windows(2) {
            let prev: Vec<char> = pair[0].chars().collect();
            let tail: String = prev[prev.len() - 5..].iter().collect();
            assert!(
                pair[1].starts_with(&tail),
                "{:?} should start with {:?}",
                pair[1],
                tail
            );
        }
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 20);
        }
    }

    #[test]
    fn test_chunks_never_exceed_size() {
        let sentence = "The quick brown fox jumps over the lazy dog near the riverbank. ";
        let text = format!(
            "{}\n\n{}\n{}",
            sentence.repeat(20),
            sentence.repeat(3),
            "Supercalifragilisticexpialidocious".repeat(5)
        );
        let chunker = RecursiveChunker::new(120, 30).unwrap();
        let chunks = chunker.split_document(&text, Some("fox.txt"));

        assert!(chunks.len() > 5);
        for (i, chunk) in chunks.iter().enumerate() {
            assert!(chunk.text.chars().count() <= 120, "chunk {} too long", i);
            assert_eq!(chunk.text, chunk.text.trim());
            assert!(!chunk.text.is_empty());
            assert_eq!(chunk.sequence_index, i);
            assert_eq!(chunk.source_document.as_deref(), Some("fox.txt"));
        }
    }

    #[test]
    fn test_length_is_measured_in_chars() {
        // 2-byte chars: a byte-based limit would split this in half
        let text = "é".repeat(50);
        let chunks = split(&text, 50, 0).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, text);

        let text = "é".repeat(51);
        let chunks = split(&text, 50, 0).unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text.chars().count(), 50);
        assert_eq!(chunks[1].text, "é");
    }

    #[test]
    fn test_deterministic() {
        let text = "Line one\nLine two\n\nAnother paragraph with several words in it.".repeat(10);
        let first = split(&text, 60, 15).unwrap();
        let second = split(&text, 60, 15).unwrap();
        assert_eq!(first, second);
    }
}
