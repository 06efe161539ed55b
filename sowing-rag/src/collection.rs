//! A single dimension-fixed collection of index entries.
//!
//! Shared by the in-memory and file-backed stores so both apply the same
//! upsert, validation and ranking rules.

use std::collections::HashMap;

use crate::document::{IndexEntry, QueryResult};
use crate::error::{RagError, Result};
use crate::vectorstore::cosine_similarity;

/// Ordered entries plus an id index.
#[derive(Debug, Clone)]
pub(crate) struct Collection {
    dimension: usize,
    entries: Vec<IndexEntry>,
    positions: HashMap<String, usize>,
}

impl Collection {
    pub(crate) fn new(dimension: usize) -> Self {
        Self { dimension, entries: Vec::new(), positions: HashMap::new() }
    }

    /// Rebuild a collection from persisted entries.
    pub(crate) fn from_entries(dimension: usize, entries: Vec<IndexEntry>) -> Result<Self> {
        let mut collection = Self::new(dimension);
        for entry in entries {
            collection.check_dimension(entry.vector.len())?;
            collection.upsert(entry);
        }
        Ok(collection)
    }

    pub(crate) fn dimension(&self) -> usize {
        self.dimension
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub(crate) fn check_dimension(&self, actual: usize) -> Result<()> {
        if actual != self.dimension {
            return Err(RagError::DimensionMismatch { expected: self.dimension, actual });
        }
        Ok(())
    }

    /// Validate every entry, then insert them all.
    pub(crate) fn insert_all(&mut self, entries: &[IndexEntry]) -> Result<()> {
        for entry in entries {
            self.check_dimension(entry.vector.len())?;
            check_finite(&entry.id, &entry.vector)?;
        }
        for entry in entries {
            self.upsert(entry.clone());
        }
        Ok(())
    }

    /// Replace an entry with the same id in place, or append.
    fn upsert(&mut self, entry: IndexEntry) {
        match self.positions.get(&entry.id) {
            Some(&position) => self.entries[position] = entry,
            None => {
                self.positions.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub(crate) fn search(&self, vector: &[f32], top_k: usize) -> Result<Vec<QueryResult>> {
        self.check_dimension(vector.len())?;
        check_finite("query", vector)?;
        if top_k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(&entry.vector, vector)))
            .collect();

        // stable: equal scores keep insertion order
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(top_k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| {
                let entry = &self.entries[i];
                QueryResult {
                    id: entry.id.clone(),
                    text: entry.text.clone(),
                    metadata: entry.metadata.clone(),
                    score,
                }
            })
            .collect())
    }
}

/// NaN and infinity have no JSON encoding.
fn check_finite(id: &str, vector: &[f32]) -> Result<()> {
    if vector.iter().all(|x| x.is_finite()) {
        Ok(())
    } else {
        Err(RagError::NonFiniteVector { id: id.to_string() })
    }
}
