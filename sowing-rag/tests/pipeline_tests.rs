//! End-to-end ingestion and retrieval against the durable store.

use std::sync::Arc;

use sowing_rag::{
    Document, FileVectorStore, HashEmbeddingProvider, RagConfig, RagPipeline, SentenceChunker,
};

async fn pipeline_at(root: &std::path::Path, max_tokens: usize) -> RagPipeline {
    let config = RagConfig::builder().max_tokens(max_tokens).build().unwrap();
    let pipeline = RagPipeline::builder()
        .config(config)
        .embedding_provider(Arc::new(HashEmbeddingProvider::default()))
        .vector_store(Arc::new(FileVectorStore::open(root).await.unwrap()))
        .chunker(Arc::new(SentenceChunker::new(max_tokens)))
        .build()
        .unwrap();
    pipeline.open().await.unwrap();
    pipeline
}

#[tokio::test]
async fn two_sentence_document_retrieves_rice_chunk() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_at(dir.path(), 5).await;

    let report = pipeline
        .ingest(&Document::new(
            "crops.md",
            "Rice grows well in monsoon. Wheat prefers cooler climate.",
        ))
        .await
        .unwrap();
    assert_eq!(report.chunks_stored, 2);

    let results = pipeline.search_query("rice sowing", 1).await.unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].document, "Rice grows well in monsoon.");
    assert_eq!(results[0].filename, "crops.md");
    assert_eq!(results[0].chunk_index, 0);
}

#[tokio::test]
async fn chunk_text_is_its_own_best_match() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_at(dir.path(), 8).await;
    pipeline
        .ingest(&Document::new(
            "paddy.md",
            "Transplant paddy seedlings after twenty five days. Keep two inches of standing water.",
        ))
        .await
        .unwrap();

    let results =
        pipeline.search_query("Keep two inches of standing water.", 1).await.unwrap();
    assert_eq!(results[0].document, "Keep two inches of standing water.");
    assert!((results[0].score - 1.0).abs() < 1e-4);
}

#[tokio::test]
async fn empty_store_returns_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline_at(dir.path(), 50).await;
    assert!(pipeline.search_query("anything", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn directory_ingest_persists_across_restart() {
    let docs = tempfile::tempdir().unwrap();
    std::fs::write(docs.path().join("rice.md"), "Rice grows well in monsoon.").unwrap();
    std::fs::write(docs.path().join("wheat.txt"), "Wheat prefers cooler climate.").unwrap();
    std::fs::write(docs.path().join("broken.md"), [0xff, 0xfe, 0xfd]).unwrap();
    std::fs::write(docs.path().join("scan.pdf"), "%PDF-1.7").unwrap();

    let store = tempfile::tempdir().unwrap();
    {
        let pipeline = pipeline_at(store.path(), 50).await;
        let report = pipeline.ingest_dir(docs.path()).await.unwrap();
        assert_eq!(report.documents.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].document.ends_with("broken.md"));
        assert_eq!(report.chunks_stored(), 2);
        pipeline.shutdown().await.unwrap();
    }

    let pipeline = pipeline_at(store.path(), 50).await;
    let health = pipeline.health().await;
    assert_eq!(health.entries, Some(2));

    let results = pipeline.search_query("wheat climate", 1).await.unwrap();
    assert_eq!(results[0].filename, "wheat.txt");
}

#[tokio::test]
async fn same_file_name_in_subdirectories_keeps_both_documents() {
    let docs = tempfile::tempdir().unwrap();
    std::fs::create_dir(docs.path().join("kharif")).unwrap();
    std::fs::create_dir(docs.path().join("rabi")).unwrap();
    std::fs::write(docs.path().join("kharif/guide.md"), "Rice grows well in monsoon.").unwrap();
    std::fs::write(docs.path().join("rabi/guide.md"), "Wheat prefers cooler climate.").unwrap();

    let store = tempfile::tempdir().unwrap();
    let pipeline = pipeline_at(store.path(), 50).await;
    let report = pipeline.ingest_dir(docs.path()).await.unwrap();
    assert_eq!(report.chunks_stored(), 2);
    assert!(report.failures.is_empty());
    assert_eq!(pipeline.health().await.entries, Some(2));

    let rice = pipeline.search_query("rice monsoon", 1).await.unwrap();
    assert_eq!(rice[0].document, "Rice grows well in monsoon.");
    assert_eq!(rice[0].filename, "kharif/guide.md");

    let wheat = pipeline.search_query("wheat climate", 1).await.unwrap();
    assert_eq!(wheat[0].filename, "rabi/guide.md");
}
