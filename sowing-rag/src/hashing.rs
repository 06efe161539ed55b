//! Local, deterministic embedding provider based on feature hashing.
//!
//! Each lowercase alphanumeric token is hashed with SHA-256 into one of
//! `dimensions` buckets with a ±1 sign, and the bucket sums are L2-normalized.
//! Texts sharing words therefore have positive cosine similarity, which is
//! enough for keyword-style retrieval without a network model.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Default output dimensionality.
pub const DEFAULT_HASH_DIMENSIONS: usize = 384;

/// An [`EmbeddingProvider`] that needs no model and no network.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    /// Create a provider producing vectors of `dimensions` components.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::ConfigError(
                "embedding dimensions must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut head = [0u8; 8];
            head.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(head) % self.dimensions as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

impl Default for HashEmbeddingProvider {
    fn default() -> Self {
        Self { dimensions: DEFAULT_HASH_DIMENSIONS }
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()).map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_sync(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "hash"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vectorstore::cosine_similarity;

    #[tokio::test]
    async fn output_has_configured_dimension() {
        let provider = HashEmbeddingProvider::new(64).unwrap();
        let vector = provider.embed("Rice grows well in monsoon.").await.unwrap();
        assert_eq!(vector.len(), 64);
    }

    #[tokio::test]
    async fn identical_text_embeds_identically() {
        let provider = HashEmbeddingProvider::default();
        let a = provider.embed("Wheat prefers cooler climate.").await.unwrap();
        let b = provider.embed("Wheat prefers cooler climate.").await.unwrap();
        assert_eq!(a, b);
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn case_and_punctuation_are_ignored() {
        let provider = HashEmbeddingProvider::default();
        let a = provider.embed("RICE, sowing!").await.unwrap();
        let b = provider.embed("rice sowing").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn shared_words_score_higher() {
        let provider = HashEmbeddingProvider::default();
        let query = provider.embed("rice sowing").await.unwrap();
        let rice = provider.embed("Rice grows well in monsoon.").await.unwrap();
        let wheat = provider.embed("Wheat prefers cooler climate.").await.unwrap();
        assert!(cosine_similarity(&query, &rice) > cosine_similarity(&query, &wheat));
    }

    #[tokio::test]
    async fn empty_text_is_zero_vector() {
        let provider = HashEmbeddingProvider::new(8).unwrap();
        let vector = provider.embed("  ...  ").await.unwrap();
        assert!(vector.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn zero_dimensions_rejected() {
        assert!(matches!(HashEmbeddingProvider::new(0), Err(RagError::ConfigError(_))));
    }
}
