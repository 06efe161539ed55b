//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Default word budget per chunk.
pub const DEFAULT_MAX_TOKENS: usize = 50;

/// Default number of chunks retrieved per query.
pub const DEFAULT_TOP_K: usize = 5;

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "doc_chunks";

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagConfig {
    /// Maximum number of whitespace-delimited words per chunk.
    pub max_tokens: usize,
    /// Number of top results to return from vector search.
    pub top_k: usize,
    /// Name of the collection chunks are stored in.
    pub collection: String,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
            collection: DEFAULT_COLLECTION.to_string(),
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the per-chunk word budget.
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = max_tokens;
        self
    }

    /// Set the number of top results to return from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `max_tokens == 0`
    /// - `top_k == 0`
    /// - the collection name is empty or contains characters other than
    ///   ASCII letters, digits, `_` and `-`
    pub fn build(self) -> Result<RagConfig> {
        if self.config.max_tokens == 0 {
            return Err(RagError::ConfigError("max_tokens must be greater than zero".to_string()));
        }
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        validate_collection_name(&self.config.collection)?;
        Ok(self.config)
    }
}

/// Check that a collection name is usable as a file stem.
pub(crate) fn validate_collection_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RagError::ConfigError("collection name must not be empty".to_string()));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
        return Err(RagError::ConfigError(format!(
            "collection name '{name}' may only contain ASCII letters, digits, '_' and '-'"
        )));
    }
    Ok(())
}
