//! Retrieval-augmented generation core for the Sowing Advisory assistant.
//!
//! This crate provides:
//! - Sentence-bounded, word-budgeted chunking ([`SentenceChunker`])
//! - Embedding providers behind [`EmbeddingProvider`]: an offline
//!   [`HashEmbeddingProvider`] and, with the `openai` feature, an
//!   OpenAI-compatible HTTP client
//! - Vector stores behind [`VectorStore`]: [`InMemoryVectorStore`] and the
//!   durable [`FileVectorStore`]
//! - Retrieval, grounding-prompt assembly and the generative model boundary
//! - [`RagPipeline`], which wires these together for ingestion and answering
//!
//! # Features
//!
//! | feature  | adds |
//! |----------|------|
//! | `openai` | `openai::OpenAIEmbeddingProvider` |
//! | `azure`  | `azure::AzureOpenAIGenerator` |
//! | `full`   | both |

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod file;
pub mod generation;
pub mod hashing;
pub mod inmemory;
pub mod loader;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod vectorstore;

mod collection;

#[cfg(feature = "azure")]
pub mod azure;
#[cfg(feature = "openai")]
pub mod openai;

pub use chunking::{Chunker, SentenceChunker, chunk_text};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, ChunkMetadata, Document, IndexEntry, QueryResult, RetrievedChunk};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use file::FileVectorStore;
pub use generation::{AnswerGenerator, AnswerPayload};
pub use hashing::HashEmbeddingProvider;
pub use inmemory::InMemoryVectorStore;
pub use loader::{discover_documents, read_document};
pub use pipeline::{
    DocumentReport, HealthReport, HealthStatus, IngestFailure, IngestReport, RagPipeline,
    RagPipelineBuilder,
};
pub use prompt::build_prompt;
pub use retriever::Retriever;
pub use vectorstore::{VectorStore, cosine_similarity};
