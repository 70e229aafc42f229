//! End-to-end pipeline tests over fake providers.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use studymate_rag::completion::{CompletionProvider, CompletionRequest};
use studymate_rag::document::Chunk;
use studymate_rag::embedding::EmbeddingProvider;
use studymate_rag::error::{RagError, Result};
use studymate_rag::inmemory::InMemoryVectorStore;
use studymate_rag::pipeline::{NO_MATCH_RESPONSE, RagPipeline};
use studymate_rag::config::RagConfig;

/// Embeds text as keyword-occurrence counts, so similarity is driven by
/// shared vocabulary and tests can steer which chunk a query lands on.
struct KeywordEmbedder {
    keywords: Vec<&'static str>,
    calls: AtomicUsize,
}

impl KeywordEmbedder {
    fn new(keywords: Vec<&'static str>) -> Self {
        Self { keywords, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let lower = text.to_lowercase();
        Ok(self.keywords.iter().map(|k| lower.matches(k).count() as f32).collect())
    }

    fn dimensions(&self) -> usize {
        self.keywords.len()
    }
}

/// An embedder that always fails, for abort-before-upsert checks.
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(RagError::EmbeddingError {
            provider: "fake".into(),
            message: "provider unavailable".into(),
        })
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Embeds text length as a one-dimensional vector, but finishes earlier
/// submissions later, so concurrent embedding completes out of submission
/// order.
struct StaggeredEmbedder {
    calls: AtomicUsize,
}

#[async_trait]
impl EmbeddingProvider for StaggeredEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        // First submissions sleep longest.
        let delay = 50u64.saturating_sub(call as u64 * 10);
        tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
        Ok(vec![text.chars().count() as f32])
    }

    fn dimensions(&self) -> usize {
        1
    }
}

/// Captures upsert batches instead of indexing them.
#[derive(Default)]
struct RecordingStore {
    upserts: tokio::sync::Mutex<Vec<Vec<studymate_rag::document::EmbeddingRecord>>>,
}

#[async_trait]
impl studymate_rag::vectorstore::VectorStore for RecordingStore {
    async fn ensure_collection(&self, _name: &str, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(
        &self,
        _collection: &str,
        records: &[studymate_rag::document::EmbeddingRecord],
    ) -> Result<()> {
        self.upserts.lock().await.push(records.to_vec());
        Ok(())
    }

    async fn query(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _top_k: usize,
        _document_id: Option<&str>,
    ) -> Result<Vec<studymate_rag::document::RetrievedMatch>> {
        Ok(Vec::new())
    }
}

/// Returns a canned response and counts invocations.
struct CannedCompleter {
    response: &'static str,
    calls: AtomicUsize,
}

impl CannedCompleter {
    fn new(response: &'static str) -> Self {
        Self { response, calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl CompletionProvider for CannedCompleter {
    async fn complete(&self, _request: CompletionRequest) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.to_string())
    }
}

fn chunk(text: &str, page: u32, index: usize) -> Chunk {
    Chunk { text: text.to_string(), page_number: page, chunk_index: index }
}

fn build_pipeline(
    embedder: Arc<dyn EmbeddingProvider>,
    completer: Arc<CannedCompleter>,
) -> RagPipeline {
    RagPipeline::builder()
        .config(RagConfig::default())
        .embedding_provider(embedder)
        .vector_store(Arc::new(InMemoryVectorStore::new()))
        .completion_provider(completer)
        .build()
        .unwrap()
}

/// A 3-page document where the photosynthesis material sits on page 2:
/// a question about photosynthesis must cite page 2 first.
#[tokio::test]
async fn top_citation_comes_from_the_best_matching_page() {
    let embedder = Arc::new(KeywordEmbedder::new(vec!["photosynthesis", "mitosis", "gravity"]));
    let completer = Arc::new(CannedCompleter::new("Photosynthesis is covered on page 2."));
    let pipeline = build_pipeline(embedder, completer.clone());
    pipeline.ensure_collection().await.unwrap();

    let chunks = vec![
        chunk("mitosis mitosis cell division", 1, 0),
        chunk("mitosis phases prophase metaphase", 1, 1),
        chunk("photosynthesis converts light energy", 2, 2),
        chunk("photosynthesis photosynthesis chlorophyll", 2, 3),
        chunk("gravity pulls objects together", 3, 4),
        chunk("gravity and orbital mechanics", 3, 5),
        chunk("gravity on planetary scales", 3, 6),
    ];
    assert_eq!(pipeline.ingest("bio_text", &chunks).await.unwrap(), 7);

    let answer = pipeline.answer("explain photosynthesis", Some("bio_text")).await.unwrap();

    assert_eq!(answer.response, "Photosynthesis is covered on page 2.");
    assert!(!answer.citations.is_empty());
    assert_eq!(answer.citations[0].page, 2);
    assert!(answer.citations.len() <= 3);
    assert_eq!(completer.calls.load(Ordering::SeqCst), 1);
}

/// Querying a never-ingested document id returns the fixed fallback and
/// makes no completion call.
#[tokio::test]
async fn unknown_document_short_circuits_without_completion() {
    let embedder = Arc::new(KeywordEmbedder::new(vec!["photosynthesis"]));
    let completer = Arc::new(CannedCompleter::new("should never be returned"));
    let pipeline = build_pipeline(embedder, completer.clone());
    pipeline.ensure_collection().await.unwrap();

    pipeline
        .ingest("bio_text", &[chunk("photosynthesis converts light", 1, 0)])
        .await
        .unwrap();

    let answer = pipeline.answer("photosynthesis?", Some("other_doc")).await.unwrap();

    assert_eq!(answer.response, NO_MATCH_RESPONSE);
    assert!(answer.citations.is_empty());
    assert_eq!(completer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_question_is_rejected_before_any_external_call() {
    let embedder = Arc::new(KeywordEmbedder::new(vec!["a"]));
    let completer = Arc::new(CannedCompleter::new("unused"));
    let pipeline = build_pipeline(embedder.clone(), completer.clone());
    pipeline.ensure_collection().await.unwrap();

    let result = pipeline.answer("   \n ", Some("doc")).await;

    assert!(matches!(result, Err(RagError::InvalidInput(_))));
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    assert_eq!(completer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn empty_chunk_list_ingests_nothing_without_provider_calls() {
    let embedder = Arc::new(KeywordEmbedder::new(vec!["a"]));
    let completer = Arc::new(CannedCompleter::new("unused"));
    let pipeline = build_pipeline(embedder.clone(), completer);
    pipeline.ensure_collection().await.unwrap();

    assert_eq!(pipeline.ingest("thin_doc", &[]).await.unwrap(), 0);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
}

/// A failed embedding aborts the document's ingestion before any write:
/// the index must not expose a partially embedded document. The provider
/// error reaches the caller typed, not rewrapped.
#[tokio::test]
async fn embedding_failure_leaves_the_index_untouched() {
    let store = Arc::new(InMemoryVectorStore::new());
    let failing = RagPipeline::builder()
        .config(RagConfig::default())
        .embedding_provider(Arc::new(FailingEmbedder))
        .vector_store(store.clone())
        .completion_provider(Arc::new(CannedCompleter::new("unused")))
        .build()
        .unwrap();
    failing.ensure_collection().await.unwrap();

    let chunks = vec![chunk("some text to embed", 1, 0), chunk("more text", 1, 1)];
    let result = failing.ingest("doc", &chunks).await;
    assert!(matches!(result, Err(RagError::EmbeddingError { .. })));

    use studymate_rag::vectorstore::VectorStore;
    let matches = store.query("document_embeddings", &[1.0, 0.0, 0.0, 0.0], 5, None).await.unwrap();
    assert!(matches.is_empty());
}

/// Concurrent embedding may finish out of submission order, but the upsert
/// batch must still line up with chunk order: record `i` carries chunk
/// index `i` and the embedding of chunk `i`'s own text.
#[tokio::test]
async fn ingest_upserts_records_in_chunk_index_order() {
    let store = Arc::new(RecordingStore::default());
    let pipeline = RagPipeline::builder()
        .config(RagConfig::default())
        .embedding_provider(Arc::new(StaggeredEmbedder { calls: AtomicUsize::new(0) }))
        .vector_store(store.clone())
        .completion_provider(Arc::new(CannedCompleter::new("unused")))
        .build()
        .unwrap();
    pipeline.ensure_collection().await.unwrap();

    // Distinct lengths so each chunk's embedding identifies its text.
    let chunks: Vec<Chunk> =
        (0..6).map(|i| chunk(&"x".repeat(10 + i), 1, i)).collect();
    assert_eq!(pipeline.ingest("doc", &chunks).await.unwrap(), 6);

    let upserts = store.upserts.lock().await;
    assert_eq!(upserts.len(), 1);
    for (i, record) in upserts[0].iter().enumerate() {
        assert_eq!(record.metadata.chunk_index, i);
        assert_eq!(record.id, format!("doc_chunk_{i}"));
        assert_eq!(record.embedding, vec![chunks[i].text.chars().count() as f32]);
    }
}

/// Re-ingesting the same document overwrites via deterministic ids rather
/// than duplicating records.
#[tokio::test]
async fn reingestion_supersedes_instead_of_duplicating() {
    let embedder = Arc::new(KeywordEmbedder::new(vec!["photosynthesis", "mitosis"]));
    let completer = Arc::new(CannedCompleter::new("answer"));
    let pipeline = build_pipeline(embedder, completer);
    pipeline.ensure_collection().await.unwrap();

    let chunks = vec![chunk("photosynthesis overview", 1, 0)];
    pipeline.ingest("doc", &chunks).await.unwrap();
    pipeline.ingest("doc", &chunks).await.unwrap();

    let answer = pipeline.answer("photosynthesis", Some("doc")).await.unwrap();
    assert_eq!(answer.citations.len(), 1);
}

/// Citation order follows retrieval rank, best match first.
#[tokio::test]
async fn citations_follow_retrieval_rank() {
    let embedder = Arc::new(KeywordEmbedder::new(vec!["alpha", "beta"]));
    let completer = Arc::new(CannedCompleter::new("answer"));
    let pipeline = build_pipeline(embedder, completer);
    pipeline.ensure_collection().await.unwrap();

    let chunks = vec![
        chunk("alpha alpha alpha strongly relevant", 5, 0),
        chunk("alpha beta mixed relevance here", 6, 1),
        chunk("beta beta beta barely related", 7, 2),
    ];
    pipeline.ingest("doc", &chunks).await.unwrap();

    let answer = pipeline.answer("alpha", Some("doc")).await.unwrap();
    let pages: Vec<u32> = answer.citations.iter().map(|c| c.page).collect();
    assert_eq!(pages[0], 5);
    assert_eq!(pages[1], 6);
}
