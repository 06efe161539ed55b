use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use sowing_rag::azure::AzureOpenAIGenerator;
use sowing_rag::openai::OpenAIEmbeddingProvider;
use sowing_rag::{
    AnswerGenerator, EmbeddingProvider, FileVectorStore, HashEmbeddingProvider, RagConfig,
    RagPipeline,
};
use tracing::warn;

use crate::cli::{Cli, Command, EmbedderKind, GlobalArgs};

/// Dispatch a parsed command line, writing user-facing output to `out`.
pub async fn run(cli: Cli, out: &mut dyn Write) -> anyhow::Result<()> {
    let global = cli.global;
    match cli.command {
        Command::Ingest { dir } => {
            let pipeline = open_pipeline(&global, None).await?;
            run_ingest(&pipeline, &dir, out).await?;
            pipeline.shutdown().await?;
        }
        Command::Query { text, k, json } => {
            let pipeline = open_pipeline(&global, None).await?;
            run_query(&pipeline, &text, k.unwrap_or(global.top_k), json, out).await?;
        }
        Command::Ask { text } => {
            let generator: Arc<dyn AnswerGenerator> = Arc::new(
                AzureOpenAIGenerator::from_env().context("answer generator is not configured")?,
            );
            let pipeline = open_pipeline(&global, Some(generator)).await?;
            run_ask(&pipeline, &text, out).await?;
        }
        Command::Health => {
            let generator = match AzureOpenAIGenerator::from_env() {
                Ok(generator) => Some(Arc::new(generator) as Arc<dyn AnswerGenerator>),
                Err(e) => {
                    warn!(error = %e, "answer generator not configured");
                    None
                }
            };
            let pipeline = open_pipeline(&global, generator).await?;
            run_health(&pipeline, out).await?;
        }
    }
    Ok(())
}

fn build_embedder(global: &GlobalArgs) -> anyhow::Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match global.embedder {
        EmbedderKind::Hash => Arc::new(HashEmbeddingProvider::new(global.dimensions)?),
        EmbedderKind::Openai => {
            Arc::new(OpenAIEmbeddingProvider::from_env()?.with_dimensions(global.dimensions))
        }
    };
    Ok(embedder)
}

async fn open_pipeline(
    global: &GlobalArgs,
    generator: Option<Arc<dyn AnswerGenerator>>,
) -> anyhow::Result<RagPipeline> {
    let config = RagConfig::builder()
        .max_tokens(global.max_tokens)
        .top_k(global.top_k)
        .collection(global.collection.clone())
        .build()?;

    let store = FileVectorStore::open(&global.store)
        .await
        .with_context(|| format!("cannot open store at {}", global.store.display()))?;

    let mut builder = RagPipeline::builder()
        .config(config)
        .embedding_provider(build_embedder(global)?)
        .vector_store(Arc::new(store));
    if let Some(generator) = generator {
        builder = builder.generator(generator);
    }

    let pipeline = builder.build()?;
    pipeline.open().await.context("vector store unavailable")?;
    Ok(pipeline)
}

/// Run the `sowing ingest` command.
pub async fn run_ingest(
    pipeline: &RagPipeline,
    dir: &Path,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let report = pipeline.ingest_dir(dir).await?;

    for document in &report.documents {
        write!(
            out,
            "{}: {}/{} chunks stored",
            document.document, document.chunks_stored, document.chunks_total
        )?;
        if !document.failed_chunks.is_empty() {
            write!(out, " ({} failed)", document.failed_chunks.len())?;
        }
        writeln!(out)?;
    }
    for failure in &report.failures {
        writeln!(out, "{}: skipped ({})", failure.document, failure.error)?;
    }
    writeln!(
        out,
        "Ingested {} documents, {} chunks stored, {} documents skipped.",
        report.documents.len(),
        report.chunks_stored(),
        report.failures.len()
    )?;
    Ok(())
}

/// Run the `sowing query` command.
pub async fn run_query(
    pipeline: &RagPipeline,
    text: &str,
    k: usize,
    json: bool,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let results = pipeline.search_query(text, k).await?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&results)?)?;
        return Ok(());
    }
    if results.is_empty() {
        writeln!(out, "No matching chunks found.")?;
        return Ok(());
    }
    for (rank, chunk) in results.iter().enumerate() {
        writeln!(
            out,
            "{}. {} #{} (score {:.4})\n   {}",
            rank + 1,
            chunk.filename,
            chunk.chunk_index,
            chunk.score,
            chunk.document
        )?;
    }
    Ok(())
}

/// Run the `sowing ask` command.
pub async fn run_ask(pipeline: &RagPipeline, text: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let payload = pipeline.ask(text).await;
    writeln!(out, "{}", serde_json::to_string(&payload)?)?;
    Ok(())
}

/// Run the `sowing health` command.
pub async fn run_health(pipeline: &RagPipeline, out: &mut dyn Write) -> anyhow::Result<()> {
    let report = pipeline.health().await;
    writeln!(out, "{}", serde_json::to_string_pretty(&report)?)?;
    Ok(())
}
