//! Data types for documents, chunks, index entries, and search results.

use serde::{Deserialize, Serialize};

/// A source document whose text has already been extracted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    /// Source file name; also the prefix of every chunk id.
    pub id: String,
    /// Plain UTF-8 text of the document.
    pub text: String,
}

impl Document {
    /// Create a document from a file name and its text.
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into() }
    }
}

/// A sentence-bounded segment of a [`Document`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// `{filename}_{chunk_index}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Zero-based position of the chunk within its document.
    pub chunk_index: usize,
    /// The file name of the parent [`Document`].
    pub filename: String,
}

impl Chunk {
    /// Build the stable id for the chunk at `index` of `filename`.
    pub fn make_id(filename: &str, index: usize) -> String {
        format!("{filename}_{index}")
    }
}

/// Provenance stored alongside every vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// File name of the source document.
    pub filename: String,
    /// Position of the chunk within that document.
    pub chunk_index: usize,
}

/// A record held by a [`VectorStore`](crate::VectorStore).
///
/// Serialized with the persisted field names `id`, `vector`, `document`
/// and `metadata`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// Unique id within the collection.
    pub id: String,
    /// The embedding of `text`.
    pub vector: Vec<f32>,
    /// The chunk text.
    #[serde(rename = "document")]
    pub text: String,
    /// Source file and chunk position.
    pub metadata: ChunkMetadata,
}

impl IndexEntry {
    /// Pair a chunk with its embedding.
    pub fn from_chunk(chunk: Chunk, vector: Vec<f32>) -> Self {
        Self {
            id: chunk.id,
            vector,
            text: chunk.text,
            metadata: ChunkMetadata { filename: chunk.filename, chunk_index: chunk.chunk_index },
        }
    }
}

/// A stored entry paired with its similarity to a query vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResult {
    /// Id of the matched entry.
    pub id: String,
    /// Text of the matched entry.
    pub text: String,
    /// Provenance of the matched entry.
    pub metadata: ChunkMetadata,
    /// Cosine similarity (higher is more relevant).
    pub score: f32,
}

/// A retrieved chunk as handed to prompt assembly and diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievedChunk {
    /// The chunk text.
    pub document: String,
    /// Source file name.
    pub filename: String,
    /// Position within the source file.
    pub chunk_index: usize,
    /// Similarity to the query.
    pub score: f32,
}

impl From<QueryResult> for RetrievedChunk {
    fn from(result: QueryResult) -> Self {
        Self {
            document: result.text,
            filename: result.metadata.filename,
            chunk_index: result.metadata.chunk_index,
            score: result.score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_entry_uses_persisted_field_names() {
        let chunk = Chunk {
            id: Chunk::make_id("rice.md", 3),
            text: "Transplant seedlings after 25 days.".to_string(),
            chunk_index: 3,
            filename: "rice.md".to_string(),
        };
        let entry = IndexEntry::from_chunk(chunk, vec![0.5, 0.5]);
        let value = serde_json::to_value(&entry).unwrap();

        assert_eq!(value["id"], "rice.md_3");
        assert_eq!(value["document"], "Transplant seedlings after 25 days.");
        assert_eq!(value["metadata"]["filename"], "rice.md");
        assert_eq!(value["metadata"]["chunk_index"], 3);
        assert_eq!(value["vector"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn retrieved_chunk_keeps_provenance() {
        let result = QueryResult {
            id: "wheat.md_0".to_string(),
            text: "Wheat prefers cooler climate.".to_string(),
            metadata: ChunkMetadata { filename: "wheat.md".to_string(), chunk_index: 0 },
            score: 0.75,
        };
        let retrieved = RetrievedChunk::from(result);
        assert_eq!(retrieved.document, "Wheat prefers cooler climate.");
        assert_eq!(retrieved.filename, "wheat.md");
        assert_eq!(retrieved.chunk_index, 0);
        assert_eq!(retrieved.score, 0.75);
    }
}
