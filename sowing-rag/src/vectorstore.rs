//! Vector store trait for storing and searching vector embeddings.

use async_trait::async_trait;

use crate::document::{IndexEntry, QueryResult};
use crate::error::Result;

/// A storage backend for vector embeddings with similarity search.
///
/// Implementations manage named, dimension-fixed collections of
/// [`IndexEntry`] records. Adding an entry whose id already exists replaces
/// that entry in place. There is no delete operation.
///
/// # Example
///
/// ```rust,ignore
/// use sowing_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("doc_chunks", 384).await?;
/// store.add_batch("doc_chunks", &entries).await?;
/// let results = store.query("doc_chunks", &query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection, or load it if it already exists.
    ///
    /// Fails with [`DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// if an existing collection was created with a different dimension.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Add one entry to a collection.
    async fn add(&self, collection: &str, entry: IndexEntry) -> Result<()>;

    /// Add several entries to a collection.
    ///
    /// Either every entry is stored or none is.
    async fn add_batch(&self, collection: &str, entries: &[IndexEntry]) -> Result<()>;

    /// Return the `top_k` entries most similar to `vector`.
    ///
    /// Results are ordered by descending cosine similarity. Entries with equal
    /// scores keep their insertion order.
    async fn query(&self, collection: &str, vector: &[f32], top_k: usize)
    -> Result<Vec<QueryResult>>;

    /// Number of entries in a collection.
    async fn count(&self, collection: &str) -> Result<usize>;

    /// Make all accepted writes durable. Called on shutdown.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Accumulates in `f64` so large finite components do not overflow.
/// Returns 0.0 if either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        assert!((cosine_similarity(&[1.0, 2.0], &[2.0, 4.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_of_orthogonal_vectors_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_with_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }

    #[test]
    fn cosine_of_huge_components_does_not_overflow() {
        let v = [1e20f32, 1e20];
        let score = cosine_similarity(&v, &v);
        assert!(score.is_finite());
        assert!((score - 1.0).abs() < 1e-6);

        let max = [f32::MAX, -f32::MAX, f32::MAX];
        assert!((cosine_similarity(&max, &max) - 1.0).abs() < 1e-6);
    }
}
