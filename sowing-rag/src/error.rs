//! Error types for the `sowing-rag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A source document could not be read or decoded.
    #[error("Ingestion error ({document}): {message}")]
    IngestionError {
        /// The document (file name or path) that failed.
        document: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The persistent store could not be opened.
    #[error("Store unavailable ({path}): {message}")]
    StoreUnavailable {
        /// Location of the store or collection file.
        path: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector did not match the dimension fixed for its collection.
    #[error("Dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the collection was created with.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },

    /// A vector contained a NaN or infinite component.
    #[error("Non-finite vector component ({id})")]
    NonFiniteVector {
        /// Entry id, or `query` for a query vector.
        id: String,
    },

    /// The generative model call failed.
    #[error("Generation error ({provider}): {message}")]
    GenerationError {
        /// The generator that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// An underlying I/O failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
