//! Boundary to the generative language model.
//!
//! The model itself is an external collaborator consumed as
//! `answer(prompt) -> text`. Results leave the pipeline as an
//! [`AnswerPayload`], which serializes to `{"answer": ...}` or
//! `{"error": ...}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// A generative model that answers a fully assembled prompt.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Produce an answer for `prompt`.
    async fn answer(&self, prompt: &str) -> Result<String>;

    /// Short identifier used in logs and health reports.
    fn name(&self) -> &str;
}

/// The externally visible result of a question.
///
/// Error messages are fixed per failure category. Underlying error detail is
/// logged, never returned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AnswerPayload {
    /// The model's answer.
    Answer(String),
    /// A category-level failure message.
    Error(String),
}

/// Message for failures while embedding the query.
pub const QUERY_FAILED: &str = "Failed to process the query.";
/// Message for failures while reading the vector store.
pub const RETRIEVAL_FAILED: &str = "The knowledge base is currently unavailable.";
/// Message for failures of the generative model.
pub const GENERATION_FAILED: &str = "Failed to generate an answer.";
/// Message when no generator is configured.
pub const GENERATOR_UNAVAILABLE: &str = "Answer generation is not configured.";
/// Message for any other failure.
pub const INTERNAL_FAILURE: &str = "An internal error occurred.";

impl AnswerPayload {
    /// Map an error to its category-level payload.
    pub fn from_error(error: &RagError) -> Self {
        let message = match error {
            RagError::EmbeddingError { .. }
            | RagError::DimensionMismatch { .. }
            | RagError::NonFiniteVector { .. } => QUERY_FAILED,
            RagError::VectorStoreError { .. } | RagError::StoreUnavailable { .. } => {
                RETRIEVAL_FAILED
            }
            RagError::GenerationError { .. } => GENERATION_FAILED,
            RagError::ConfigError(_) => GENERATOR_UNAVAILABLE,
            RagError::IngestionError { .. }
            | RagError::PipelineError(_)
            | RagError::Io(_) => INTERNAL_FAILURE,
        };
        AnswerPayload::Error(message.to_string())
    }

    /// `true` for [`AnswerPayload::Answer`].
    pub fn is_answer(&self) -> bool {
        matches!(self, AnswerPayload::Answer(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_serializes_as_answer_object() {
        let json = serde_json::to_value(AnswerPayload::Answer("Sow in June.".into())).unwrap();
        assert_eq!(json, serde_json::json!({"answer": "Sow in June."}));
    }

    #[test]
    fn error_serializes_as_error_object() {
        let json = serde_json::to_value(AnswerPayload::Error(GENERATION_FAILED.into())).unwrap();
        assert_eq!(json, serde_json::json!({"error": "Failed to generate an answer."}));
    }

    #[test]
    fn from_error_hides_internal_detail() {
        let err = RagError::GenerationError {
            provider: "AzureOpenAI".into(),
            message: "401 Unauthorized: key sk-secret".into(),
        };
        let payload = AnswerPayload::from_error(&err);
        assert_eq!(payload, AnswerPayload::Error(GENERATION_FAILED.into()));
        let AnswerPayload::Error(message) = payload else { unreachable!() };
        assert!(!message.contains("sk-secret"));
    }

    #[test]
    fn embedding_failures_map_to_query_category() {
        let err = RagError::EmbeddingError { provider: "hash".into(), message: "boom".into() };
        assert_eq!(AnswerPayload::from_error(&err), AnswerPayload::Error(QUERY_FAILED.into()));
    }
}
