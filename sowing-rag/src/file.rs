//! Durable vector store persisted as one JSON file per collection.
//!
//! Layout: `<root>/<collection>.json` holding
//! `{"version", "name", "dimension", "entries"}`. Every write is applied to a
//! copy of the collection, written to `<collection>.json.tmp`, renamed over
//! the live file, and only then swapped into memory. A failed write leaves
//! both disk and memory as they were.
//!
//! Writes are serialized within the process. Several processes writing the
//! same collection are not supported.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::collection::Collection;
use crate::config::validate_collection_name;
use crate::document::{IndexEntry, QueryResult};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Current on-disk format version.
const FORMAT_VERSION: u32 = 1;

const BACKEND: &str = "File";

// ── On-disk format ─────────────────────────────────────────────────

#[derive(Serialize)]
struct PersistedCollectionRef<'a> {
    version: u32,
    name: &'a str,
    dimension: usize,
    entries: &'a [IndexEntry],
}

#[derive(Deserialize)]
struct PersistedCollection {
    version: u32,
    name: String,
    dimension: usize,
    entries: Vec<IndexEntry>,
}

// ── Store ──────────────────────────────────────────────────────────

/// A [`VectorStore`] that keeps collections in memory and on disk.
///
/// # Example
///
/// ```rust,ignore
/// use sowing_rag::{FileVectorStore, VectorStore};
///
/// let store = FileVectorStore::open("./rag_store").await?;
/// store.create_collection("doc_chunks", 384).await?;
/// ```
#[derive(Debug)]
pub struct FileVectorStore {
    root: PathBuf,
    collections: RwLock<HashMap<String, Collection>>,
}

impl FileVectorStore {
    /// Open (and create if needed) a store rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreUnavailable`] if the directory cannot be
    /// created.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await.map_err(|e| {
            error!(path = %root.display(), error = %e, "cannot open store directory");
            unavailable(&root, format!("cannot create store directory: {e}"))
        })?;
        info!(path = %root.display(), "opened file vector store");
        Ok(Self { root, collections: RwLock::new(HashMap::new()) })
    }

    /// Directory holding the collection files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    async fn load(&self, name: &str, dimensions: usize) -> Result<Option<Collection>> {
        let path = self.collection_path(name);
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|e| unavailable(&path, format!("cannot stat collection file: {e}")))?;
        if !exists {
            return Ok(None);
        }

        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| unavailable(&path, format!("cannot read collection file: {e}")))?;
        let persisted: PersistedCollection = serde_json::from_slice(&data)
            .map_err(|e| unavailable(&path, format!("corrupt collection file: {e}")))?;

        if persisted.version != FORMAT_VERSION {
            return Err(unavailable(
                &path,
                format!("unsupported format version {}", persisted.version),
            ));
        }
        if persisted.name != name {
            return Err(unavailable(
                &path,
                format!("file holds collection '{}', expected '{name}'", persisted.name),
            ));
        }
        if persisted.dimension != dimensions {
            return Err(unavailable(
                &path,
                format!(
                    "collection has dimension {}, embedder produces {dimensions}",
                    persisted.dimension
                ),
            ));
        }

        let collection = Collection::from_entries(persisted.dimension, persisted.entries)
            .map_err(|e| unavailable(&path, e.to_string()))?;
        info!(collection = name, entries = collection.len(), "loaded collection from disk");
        Ok(Some(collection))
    }

    async fn persist(&self, name: &str, collection: &Collection) -> Result<()> {
        let path = self.collection_path(name);
        let tmp = self.root.join(format!("{name}.json.tmp"));
        let state = PersistedCollectionRef {
            version: FORMAT_VERSION,
            name,
            dimension: collection.dimension(),
            entries: collection.entries(),
        };

        let data = serde_json::to_vec(&state).map_err(|e| write_failed(name, e))?;
        tokio::fs::write(&tmp, data).await.map_err(|e| write_failed(name, e))?;
        tokio::fs::rename(&tmp, &path).await.map_err(|e| write_failed(name, e))?;
        debug!(collection = name, entries = collection.len(), "persisted collection");
        Ok(())
    }
}

fn unavailable(path: &Path, message: String) -> RagError {
    RagError::StoreUnavailable { path: path.display().to_string(), message }
}

fn write_failed(collection: &str, e: impl std::fmt::Display) -> RagError {
    error!(collection, error = %e, "failed to persist collection");
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!("failed to persist collection '{collection}': {e}"),
    }
}

fn missing(collection: &str) -> RagError {
    RagError::VectorStoreError {
        backend: BACKEND.to_string(),
        message: format!("collection '{collection}' does not exist"),
    }
}

#[async_trait]
impl VectorStore for FileVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        validate_collection_name(name)?;
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections.get(name) {
            return existing.check_dimension(dimensions);
        }

        let collection = match self.load(name, dimensions).await? {
            Some(collection) => collection,
            None => {
                let collection = Collection::new(dimensions);
                self.persist(name, &collection).await?;
                info!(collection = name, dimensions, "created collection");
                collection
            }
        };
        collections.insert(name.to_string(), collection);
        Ok(())
    }

    async fn add(&self, collection: &str, entry: IndexEntry) -> Result<()> {
        self.add_batch(collection, std::slice::from_ref(&entry)).await
    }

    async fn add_batch(&self, collection: &str, entries: &[IndexEntry]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let current = collections.get(collection).ok_or_else(|| missing(collection))?;

        let mut updated = current.clone();
        updated.insert_all(entries)?;
        self.persist(collection, &updated).await?;
        collections.insert(collection.to_string(), updated);
        Ok(())
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

    async fn flush(&self) -> Result<()> {
        // Writes are persisted eagerly; wait for any in-flight write to finish.
        let collections = self.collections.write().await;
        info!(path = %self.root.display(), collections = collections.len(), "file vector store flushed");
        Ok(())
    }
}
