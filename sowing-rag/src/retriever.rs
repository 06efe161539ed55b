//! Query-time retrieval: embed a query and rank stored chunks against it.

use std::sync::Arc;

use tracing::{debug, error};

use crate::document::RetrievedChunk;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// Embeds query text and returns the most similar stored chunks.
///
/// Must share its [`EmbeddingProvider`] with ingestion so that queries and
/// chunks live in the same vector space.
#[derive(Clone)]
pub struct Retriever {
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    collection: String,
}

impl Retriever {
    /// Create a retriever over `collection`.
    pub fn new(
        embedding_provider: Arc<dyn EmbeddingProvider>,
        vector_store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Self {
        Self { embedding_provider, vector_store, collection: collection.into() }
    }

    /// Return up to `top_k` chunks ranked by descending similarity.
    ///
    /// An empty or whitespace-only query, `top_k == 0`, or an empty collection
    /// yields an empty result without calling the embedder.
    pub async fn search_query(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        if query.trim().is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if self.vector_store.count(&self.collection).await? == 0 {
            debug!(collection = %self.collection, "collection empty, skipping search");
            return Ok(Vec::new());
        }

        let embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(provider = self.embedding_provider.name(), error = %e, "query embedding failed");
            e
        })?;
        let results = self.vector_store.query(&self.collection, &embedding, top_k).await?;

        debug!(collection = %self.collection, top_k, result_count = results.len(), "retrieved chunks");
        Ok(results.into_iter().map(RetrievedChunk::from).collect())
    }

    /// Collection this retriever reads from.
    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Chunk, IndexEntry};
    use crate::hashing::HashEmbeddingProvider;
    use crate::inmemory::InMemoryVectorStore;

    async fn seeded() -> Retriever {
        let embedder = Arc::new(HashEmbeddingProvider::default());
        let store = Arc::new(InMemoryVectorStore::new());
        store.create_collection("doc_chunks", embedder.dimensions()).await.unwrap();
        for (i, text) in ["Rice grows well in monsoon.", "Wheat prefers cooler climate."]
            .into_iter()
            .enumerate()
        {
            let chunk = Chunk {
                id: Chunk::make_id("crops.md", i),
                text: text.to_string(),
                chunk_index: i,
                filename: "crops.md".to_string(),
            };
            let vector = embedder.embed(text).await.unwrap();
            store.add("doc_chunks", IndexEntry::from_chunk(chunk, vector)).await.unwrap();
        }
        Retriever::new(embedder, store, "doc_chunks")
    }

    #[tokio::test]
    async fn finds_the_matching_chunk() {
        let retriever = seeded().await;
        let results = retriever.search_query("rice sowing", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document, "Rice grows well in monsoon.");
        assert_eq!(results[0].chunk_index, 0);
    }

    #[tokio::test]
    async fn blank_query_returns_nothing() {
        let retriever = seeded().await;
        assert!(retriever.search_query("   ", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn zero_top_k_returns_nothing() {
        let retriever = seeded().await;
        assert!(retriever.search_query("rice", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_collection_returns_nothing() {
        let store = Arc::new(InMemoryVectorStore::new());
        store.create_collection("doc_chunks", 384).await.unwrap();
        let retriever =
            Retriever::new(Arc::new(HashEmbeddingProvider::default()), store, "doc_chunks");
        assert!(retriever.search_query("rice", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn scores_are_non_increasing() {
        let retriever = seeded().await;
        let results = retriever.search_query("rice monsoon wheat", 5).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].score >= results[1].score);
    }
}
