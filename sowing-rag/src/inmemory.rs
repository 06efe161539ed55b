//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a vector store backed by a
//! `HashMap` protected by a `tokio::sync::RwLock`. Nothing survives the
//! process; use [`FileVectorStore`](crate::FileVectorStore) for durability.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::collection::Collection;
use crate::document::{IndexEntry, QueryResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// An in-memory vector store using cosine similarity for search.
///
/// # Example
///
/// ```rust,ignore
/// use sowing_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.create_collection("doc_chunks", 384).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing(collection: &str) -> RagError {
    RagError::VectorStoreError {
        backend: "InMemory".to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        let collection =
            collections.entry(name.to_string()).or_insert_with(|| Collection::new(dimensions));
        collection.check_dimension(dimensions)
    }

    async fn add(&self, collection: &str, entry: IndexEntry) -> Result<()> {
        self.add_batch(collection, std::slice::from_ref(&entry)).await
    }

    async fn add_batch(&self, collection: &str, entries: &[IndexEntry]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store = collections.get_mut(collection).ok_or_else(|| missing(collection))?;
        store.insert_all(entries)
    }

    async fn query(
        &self,
        collection: &str,
        vector: &[f32],
        top_k: usize,
    ) -> Result<Vec<QueryResult>> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        store.search(vector, top_k)
    }

    async fn count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read().await;
        let store = collections.get(collection).ok_or_else(|| missing(collection))?;
        Ok(store.len())
    }
}
