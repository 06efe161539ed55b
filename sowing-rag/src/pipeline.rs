//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] is built once at startup and shared. It composes an
//! [`EmbeddingProvider`], a [`VectorStore`], a [`Chunker`] and an optional
//! [`AnswerGenerator`], and owns the ingest, retrieve and answer workflows.
//!
//! # Example
//!
//! ```rust,ignore
//! use sowing_rag::{FileVectorStore, HashEmbeddingProvider, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
//!     .vector_store(Arc::new(FileVectorStore::open("./rag_store").await?))
//!     .build()?;
//!
//! pipeline.open().await?;
//! let report = pipeline.ingest_dir(Path::new("./docs")).await?;
//! let chunks = pipeline.search_query("rice sowing", 5).await?;
//! pipeline.shutdown().await?;
//! ```

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::chunking::{Chunker, SentenceChunker};
use crate::config::RagConfig;
use crate::document::{Document, IndexEntry, RetrievedChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{AnswerGenerator, AnswerPayload, GENERATOR_UNAVAILABLE};
use crate::loader::{discover_documents, read_document};
use crate::prompt::build_prompt;
use crate::retriever::Retriever;
use crate::vectorstore::VectorStore;

/// Outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentReport {
    /// Document id (file name).
    pub document: String,
    /// Chunks produced by the chunker.
    pub chunks_total: usize,
    /// Chunks embedded and stored.
    pub chunks_stored: usize,
    /// Indices of chunks whose embedding failed.
    pub failed_chunks: Vec<usize>,
}

/// A document that could not be ingested at all.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestFailure {
    /// Document id or path.
    pub document: String,
    /// Why it failed.
    pub error: String,
}

/// Outcome of a batch or directory ingestion.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents that were processed, possibly with skipped chunks.
    pub documents: Vec<DocumentReport>,
    /// Documents that were skipped entirely.
    pub failures: Vec<IngestFailure>,
}

impl IngestReport {
    /// Total chunks stored across all documents.
    pub fn chunks_stored(&self) -> usize {
        self.documents.iter().map(|d| d.chunks_stored).sum()
    }

    /// Total chunks whose embedding failed.
    pub fn chunks_failed(&self) -> usize {
        self.documents.iter().map(|d| d.failed_chunks.len()).sum()
    }
}

/// Coarse service state.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The collection is readable.
    Healthy,
    /// The collection cannot be read.
    Degraded,
}

/// Snapshot of the pipeline for operators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    /// Overall state.
    pub status: HealthStatus,
    /// Configured collection.
    pub collection: String,
    /// Number of stored entries, if the store answered.
    pub entries: Option<usize>,
    /// Embedding provider name.
    pub embedder: String,
    /// Answer generator name, if one is configured.
    pub generator: Option<String>,
}

/// The RAG pipeline orchestrator.
///
/// Coordinates document ingestion (chunk → embed → store) and query
/// execution (embed → search → prompt → generate). Construct one via
/// [`RagPipeline::builder()`] and call [`open`](Self::open) before use.
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    retriever: Retriever,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Return the retriever bound to the configured collection.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Create or load the configured collection.
    ///
    /// The collection is opened with the dimensionality reported by the
    /// configured [`EmbeddingProvider`].
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreUnavailable`] if the collection cannot be
    /// opened. Callers should treat this as fatal.
    pub async fn open(&self) -> Result<()> {
        let collection = &self.config.collection;
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(collection, dimensions).await.map_err(|e| {
            error!(collection = %collection, dimensions, error = %e, "failed to open collection");
            match e {
                RagError::StoreUnavailable { .. } => e,
                other => RagError::StoreUnavailable {
                    path: collection.clone(),
                    message: other.to_string(),
                },
            }
        })?;
        info!(collection = %collection, dimensions, embedder = self.embedding_provider.name(), "pipeline opened");
        Ok(())
    }

    /// Ingest a single document: chunk → embed → store.
    ///
    /// Each chunk is embedded on its own; a chunk whose embedding fails is
    /// logged, recorded in the report and skipped. The remaining chunks are
    /// stored with a single atomic batch write.
    ///
    /// # Errors
    ///
    /// Returns an error only if the store rejects the batch, in which case
    /// nothing from this document was stored.
    pub async fn ingest(&self, document: &Document) -> Result<DocumentReport> {
        let chunks = self.chunker.chunk(document);
        let chunks_total = chunks.len();
        let dimensions = self.embedding_provider.dimensions();

        let mut entries = Vec::with_capacity(chunks_total);
        let mut failed_chunks = Vec::new();
        for chunk in chunks {
            match self.embedding_provider.embed(&chunk.text).await {
                Ok(vector) if vector.len() == dimensions => {
                    entries.push(IndexEntry::from_chunk(chunk, vector));
                }
                Ok(vector) => {
                    warn!(
                        document.id = %document.id,
                        chunk_index = chunk.chunk_index,
                        expected = dimensions,
                        actual = vector.len(),
                        "embedding has wrong dimension, skipping chunk"
                    );
                    failed_chunks.push(chunk.chunk_index);
                }
                Err(e) => {
                    warn!(
                        document.id = %document.id,
                        chunk_index = chunk.chunk_index,
                        error = %e,
                        "embedding failed, skipping chunk"
                    );
                    failed_chunks.push(chunk.chunk_index);
                }
            }
        }

        if !entries.is_empty() {
            self.vector_store.add_batch(&self.config.collection, &entries).await.map_err(|e| {
                error!(document.id = %document.id, error = %e, "store rejected document");
                e
            })?;
        }

        let report = DocumentReport {
            document: document.id.clone(),
            chunks_total,
            chunks_stored: entries.len(),
            failed_chunks,
        };
        info!(
            document.id = %document.id,
            chunk_count = report.chunks_total,
            stored = report.chunks_stored,
            failed = report.failed_chunks.len(),
            "ingested document"
        );
        Ok(report)
    }

    /// Ingest several documents. A failing document is recorded and the
    /// batch continues.
    pub async fn ingest_batch(&self, documents: &[Document]) -> IngestReport {
        let mut report = IngestReport::default();
        for document in documents {
            self.ingest_into(document, &mut report).await;
        }
        report
    }

    /// Ingest every text document found under `dir`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::IngestionError`] if `dir` cannot be listed. Errors
    /// reading or storing individual documents are recorded in the report.
    pub async fn ingest_dir(&self, dir: &Path) -> Result<IngestReport> {
        let paths = discover_documents(dir)?;
        info!(dir = %dir.display(), documents = paths.len(), "ingesting directory");

        let mut report = IngestReport::default();
        for path in paths {
            match read_document(dir, &path).await {
                Ok(document) => self.ingest_into(&document, &mut report).await,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable document");
                    report
                        .failures
                        .push(IngestFailure { document: path.display().to_string(), error: e.to_string() });
                }
            }
        }

        info!(
            documents = report.documents.len(),
            failures = report.failures.len(),
            chunks_stored = report.chunks_stored(),
            "directory ingestion finished"
        );
        Ok(report)
    }

    async fn ingest_into(&self, document: &Document, report: &mut IngestReport) {
        match self.ingest(document).await {
            Ok(document_report) => report.documents.push(document_report),
            Err(e) => report
                .failures
                .push(IngestFailure { document: document.id.clone(), error: e.to_string() }),
        }
    }

    /// Return up to `top_k` chunks most similar to `query`.
    pub async fn search_query(&self, query: &str, top_k: usize) -> Result<Vec<RetrievedChunk>> {
        let results = self.retriever.search_query(query, top_k).await?;
        info!(top_k, result_count = results.len(), "query completed");
        Ok(results)
    }

    /// Retrieve with the configured `top_k` and assemble the grounding prompt.
    pub async fn prompt_for(&self, query: &str) -> Result<String> {
        let chunks = self.search_query(query, self.config.top_k).await?;
        Ok(build_prompt(query, &chunks))
    }

    /// Answer `query` from retrieved context.
    ///
    /// Never fails: every error is logged and turned into an
    /// [`AnswerPayload::Error`] carrying a fixed category message.
    pub async fn ask(&self, query: &str) -> AnswerPayload {
        let Some(generator) = &self.generator else {
            error!("ask called without an answer generator");
            return AnswerPayload::Error(GENERATOR_UNAVAILABLE.to_string());
        };

        let prompt = match self.prompt_for(query).await {
            Ok(prompt) => prompt,
            Err(e) => {
                error!(error = %e, "retrieval failed");
                return AnswerPayload::from_error(&e);
            }
        };

        match generator.answer(&prompt).await {
            Ok(answer) => {
                info!(generator = generator.name(), answer_len = answer.len(), "answer generated");
                AnswerPayload::Answer(answer)
            }
            Err(e) => {
                error!(generator = generator.name(), error = %e, "generation failed");
                AnswerPayload::from_error(&e)
            }
        }
    }

    /// Report whether the configured collection is readable.
    pub async fn health(&self) -> HealthReport {
        let entries = match self.vector_store.count(&self.config.collection).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!(collection = %self.config.collection, error = %e, "health check failed");
                None
            }
        };

        HealthReport {
            status: if entries.is_some() { HealthStatus::Healthy } else { HealthStatus::Degraded },
            collection: self.config.collection.clone(),
            entries,
            embedder: self.embedding_provider.name().to_string(),
            generator: self.generator.as_ref().map(|g| g.name().to_string()),
        }
    }

    /// Flush the vector store.
    pub async fn shutdown(&self) -> Result<()> {
        self.vector_store.flush().await.map_err(|e| {
            error!(error = %e, "failed to flush vector store");
            e
        })?;
        info!("pipeline shut down");
        Ok(())
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields except `generator` are required. Call [`build()`](RagPipelineBuilder::build)
/// to validate and produce the pipeline.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .chunker(Arc::new(chunker))        // optional
///     .generator(Arc::new(generator))  // optional
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker. Defaults to a [`SentenceChunker`] using
    /// [`RagConfig::max_tokens`].
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the generative model used by [`RagPipeline::ask`].
    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if the config, embedding provider or
    /// vector store is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let chunker: Arc<dyn Chunker> = match self.chunker {
            Some(chunker) => chunker,
            None => Arc::new(SentenceChunker::new(config.max_tokens)),
        };

        let retriever = Retriever::new(
            Arc::clone(&embedding_provider),
            Arc::clone(&vector_store),
            config.collection.clone(),
        );

        Ok(RagPipeline {
            config,
            embedding_provider,
            vector_store,
            chunker,
            generator: self.generator,
            retriever,
        })
    }
}
