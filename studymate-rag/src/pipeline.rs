//! Retrieval pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates ingestion (embed → upsert, with bounded
//! concurrency) and question answering (embed → query → grounded
//! completion → citations) by composing an [`EmbeddingProvider`], a
//! [`VectorStore`], and a [`CompletionProvider`].
//!
//! # Example
//!
//! ```rust,ignore
//! use studymate_rag::{RagPipeline, RagConfig, InMemoryVectorStore};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .completion_provider(Arc::new(chat))
//!     .build()?;
//!
//! pipeline.ingest("doc_1", &chunks).await?;
//! let answer = pipeline.answer("What is photosynthesis?", Some("doc_1")).await?;
//! ```

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::completion::{CompletionProvider, CompletionRequest};
use crate::config::RagConfig;
use crate::document::{Chunk, Citation, EmbeddingRecord, RetrievedMatch};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// The fixed response returned when retrieval finds nothing for the
/// requested scope. No completion call is made in that branch.
pub const NO_MATCH_RESPONSE: &str = "I couldn't find any relevant content in this document to \
     answer your question. Make sure the document has finished processing, or try rephrasing \
     the question.";

/// A grounded answer with its citations, in retrieval-rank order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The model's answer text, or the fixed fallback when nothing was
    /// retrieved.
    pub response: String,
    /// Citations derived from the top retrieved chunks. Never parsed out
    /// of the model's prose.
    pub citations: Vec<Citation>,
}

/// The retrieval pipeline orchestrator.
///
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    completion_provider: Arc<dyn CompletionProvider>,
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

    /// Create the pipeline's collection if it does not already exist,
    /// sized to the embedding provider's dimensionality.
    pub async fn ensure_collection(&self) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.ensure_collection(&self.config.collection, dimensions).await.inspect_err(
            |e| {
                error!(collection = %self.config.collection, error = %e, "failed to ensure collection");
            },
        )
    }

    /// Ingest a document's chunks: embed each chunk, then upsert the whole
    /// batch. Returns the number of records written.
    ///
    /// Embedding requests run with bounded concurrency
    /// (`config.embed_concurrency` in flight) and results keep chunk
    /// order, so the upsert batch order matches chunk-index order. Any
    /// embedding failure aborts the ingestion before the upsert; the index
    /// never observes a partially embedded document.
    ///
    /// An empty chunk list is a valid no-op: the document produced nothing
    /// indexable and no provider call is made.
    pub async fn ingest(&self, document_id: &str, chunks: &[Chunk]) -> Result<usize> {
        if document_id.trim().is_empty() {
            return Err(RagError::InvalidInput("document id must not be empty".to_string()));
        }
        if chunks.is_empty() {
            info!(document_id, chunk_count = 0, "ingested document (nothing indexable)");
            return Ok(0);
        }

        // Collected eagerly so the stream owns its futures; `buffered`
        // keeps submission order in the output.
        let embed_futures: Vec<_> =
            chunks.iter().map(|chunk| self.embedding_provider.embed(&chunk.text)).collect();
        let embeddings: Vec<Vec<f32>> = stream::iter(embed_futures)
            .buffered(self.config.embed_concurrency)
            .try_collect()
            .await
            .inspect_err(|e| {
                error!(document_id, error = %e, "embedding failed during ingestion");
            })?;

        let records: Vec<EmbeddingRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| EmbeddingRecord::from_chunk(document_id, chunk, embedding))
            .collect();

        self.vector_store.upsert(&self.config.collection, &records).await.inspect_err(|e| {
            error!(document_id, error = %e, "upsert failed during ingestion");
        })?;

        info!(document_id, chunk_count = records.len(), "ingested document");
        Ok(records.len())
    }

    /// Answer a question from the ingested material.
    ///
    /// When `document_id` is set, retrieval is scoped to that document.
    /// Zero retrieved matches short-circuits to [`NO_MATCH_RESPONSE`] with
    /// an empty citation list and makes no completion call. Otherwise one
    /// grounded completion runs and citations are derived deterministically
    /// from the top retrieved chunks, in rank order.
    pub async fn answer(&self, question: &str, document_id: Option<&str>) -> Result<Answer> {
        if question.trim().is_empty() {
            return Err(RagError::InvalidInput("question must not be empty".to_string()));
        }

        let query_embedding = self.embedding_provider.embed(question).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        let matches = self
            .vector_store
            .query(&self.config.collection, &query_embedding, self.config.top_k, document_id)
            .await
            .inspect_err(|e| {
                error!(collection = %self.config.collection, error = %e, "vector store query failed");
            })?;

        if matches.is_empty() {
            info!(document_id, "no matches retrieved, returning fallback answer");
            return Ok(Answer { response: NO_MATCH_RESPONSE.to_string(), citations: Vec::new() });
        }

        let request = CompletionRequest::user(question)
            .with_system(grounded_system_prompt(&matches))
            .with_temperature(self.config.answer_temperature)
            .with_max_tokens(self.config.answer_max_tokens);

        let response = self.completion_provider.complete(request).await.inspect_err(|e| {
            error!(error = %e, "completion failed during answer synthesis");
        })?;

        let citations: Vec<Citation> =
            matches.iter().take(self.config.max_citations).map(Citation::from_match).collect();

        info!(
            document_id,
            result_count = matches.len(),
            citation_count = citations.len(),
            "answered question"
        );

        Ok(Answer { response, citations })
    }
}

/// Build the system instruction that constrains the model to the retrieved
/// excerpts. Each excerpt is tagged with its page so the model can cite
/// pages inline; the citation list itself never depends on the model
/// echoing them correctly.
fn grounded_system_prompt(matches: &[RetrievedMatch]) -> String {
    let mut context = String::new();
    for m in matches {
        context.push_str(&format!("[Page {}]\n{}\n\n", m.page_number, m.chunk_text));
    }

    format!(
        "You are a helpful tutor. Answer the student's question using only the context \
         excerpts below, taken from their document. Each excerpt is labeled with the page it \
         comes from. Always cite the page number when referencing information. If the excerpts \
         do not contain enough information to answer, say so plainly instead of guessing.\n\n\
         Context:\n{context}"
    )
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build) to
/// validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    completion_provider: Option<Arc<dyn CompletionProvider>>,
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

    /// Set the completion provider used for answer synthesis.
    pub fn completion_provider(mut self, provider: Arc<dyn CompletionProvider>) -> Self {
        self.completion_provider = Some(provider);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let completion_provider = self
            .completion_provider
            .ok_or_else(|| RagError::ConfigError("completion_provider is required".to_string()))?;

        Ok(RagPipeline { config, embedding_provider, vector_store, completion_provider })
    }
}
