//! Sentence-bounded document chunking.
//!
//! This module provides the [`Chunker`] trait and the [`SentenceChunker`]
//! implementation, plus the free function [`chunk_text`] that carries the
//! actual algorithm.
//!
//! Sentences are found with Unicode (UAX #29) sentence boundaries and packed
//! greedily into chunks whose word count stays within a budget. A token is a
//! whitespace-delimited word; this is an approximation of model tokens and is
//! kept so chunk sizes are reproducible.

use unicode_segmentation::UnicodeSegmentation;

use crate::document::{Chunk, Document};

/// A strategy for splitting documents into chunks.
///
/// Implementations produce [`Chunk`]s with text and provenance but no
/// embeddings. Embeddings are attached later by the pipeline.
pub trait Chunker: Send + Sync {
    /// Split a document into chunks.
    ///
    /// Returns an empty `Vec` if the document has no words.
    fn chunk(&self, document: &Document) -> Vec<Chunk>;
}

/// Packs whole sentences into chunks of at most `max_tokens` words.
///
/// Chunk IDs are generated as `{document_id}_{chunk_index}`.
///
/// # Example
///
/// ```rust,ignore
/// use sowing_rag::{Chunker, Document, SentenceChunker};
///
/// let chunker = SentenceChunker::new(50);
/// let chunks = chunker.chunk(&Document::new("rice.md", text));
/// ```
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    max_tokens: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker` with the given per-chunk word budget.
    pub fn new(max_tokens: usize) -> Self {
        Self { max_tokens }
    }

    /// The per-chunk word budget.
    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, document: &Document) -> Vec<Chunk> {
        chunk_text(&document.text, self.max_tokens)
            .into_iter()
            .enumerate()
            .map(|(i, text)| Chunk {
                id: Chunk::make_id(&document.id, i),
                text,
                chunk_index: i,
                filename: document.id.clone(),
            })
            .collect()
    }
}

/// Split `text` into chunks of whole sentences.
///
/// A sentence is appended to the current chunk unless that would push the
/// chunk's word count above `max_tokens`, in which case the chunk is emitted
/// and the sentence starts the next one. A sentence that alone exceeds the
/// budget becomes its own chunk; sentences are never split. Sentences within
/// a chunk are joined with a single space.
pub fn chunk_text(text: &str, max_tokens: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut buffer: Vec<&str> = Vec::new();
    let mut buffer_tokens = 0;

    for sentence in split_sentences(text) {
        let tokens = count_tokens(sentence);
        if !buffer.is_empty() && buffer_tokens + tokens > max_tokens {
            chunks.push(buffer.join(" "));
            buffer.clear();
            buffer_tokens = 0;
        }
        buffer.push(sentence);
        buffer_tokens += tokens;
    }

    if !buffer.is_empty() {
        chunks.push(buffer.join(" "));
    }

    chunks
}

/// Number of whitespace-delimited words in `text`.
pub fn count_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Split text into trimmed, non-empty sentences.
///
/// UAX #29 may place a boundary inside a word (`"June!Harvest"`). Such pieces
/// are glued back together: a sentence only ends where the boundary is
/// preceded by whitespace, or at the end of the text.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut end = 0;

    for piece in text.split_sentence_bounds() {
        end += piece.len();
        if piece.ends_with(char::is_whitespace) {
            push_sentence(&mut sentences, &text[start..end]);
            start = end;
        }
    }

    if start < text.len() {
        push_sentence(&mut sentences, &text[start..]);
    }

    sentences
}

fn push_sentence<'a>(sentences: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_sentences_split_at_budget() {
        let chunks = chunk_text("Rice grows well in monsoon. Wheat prefers cooler climate.", 5);
        assert_eq!(chunks, vec!["Rice grows well in monsoon.", "Wheat prefers cooler climate."]);
    }

    #[test]
    fn sentences_share_a_chunk_when_they_fit() {
        let chunks = chunk_text("Rice grows well in monsoon. Wheat prefers cooler climate.", 9);
        assert_eq!(chunks, vec!["Rice grows well in monsoon. Wheat prefers cooler climate."]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(chunk_text("", 5).is_empty());
        assert!(chunk_text("   \n\t  ", 5).is_empty());
    }

    #[test]
    fn oversized_sentence_is_emitted_alone() {
        let text = "Short one. This sentence has far more words than the budget allows. Tail.";
        let chunks = chunk_text(text, 3);
        assert_eq!(
            chunks,
            vec![
                "Short one.",
                "This sentence has far more words than the budget allows.",
                "Tail.",
            ]
        );
    }

    #[test]
    fn oversized_first_sentence_produces_no_empty_chunk() {
        let chunks = chunk_text("One two three four five six. Seven.", 2);
        assert_eq!(chunks, vec!["One two three four five six.", "Seven."]);
        assert!(chunks.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn boundary_inside_a_word_is_not_a_split() {
        let chunks = chunk_text("Sow in June!Harvest in October.", 2);
        assert_eq!(chunks, vec!["Sow in June!Harvest in October."]);
    }

    #[test]
    fn line_breaks_end_sentences() {
        let sentences = split_sentences("# Paddy\nTransplant after 25 days.\n\nIrrigate weekly.");
        assert_eq!(sentences, vec!["# Paddy", "Transplant after 25 days.", "Irrigate weekly."]);
    }

    #[test]
    fn chunker_assigns_ids_and_indices_in_order() {
        let chunker = SentenceChunker::new(5);
        let document =
            Document::new("crops.md", "Rice grows well in monsoon. Wheat prefers cooler climate.");
        let chunks = chunker.chunk(&document);

        assert_eq!(chunks.len(), 2);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.chunk_index, i);
            assert_eq!(chunk.id, format!("crops.md_{i}"));
            assert_eq!(chunk.filename, "crops.md");
        }
    }

    #[test]
    fn count_tokens_uses_whitespace_words() {
        assert_eq!(count_tokens("Rice  grows\twell\nin monsoon."), 5);
        assert_eq!(count_tokens(""), 0);
    }
}
