//! Vector store trait for storing and searching embedding records.

use async_trait::async_trait;

use crate::document::{EmbeddingRecord, RetrievedMatch};
use crate::error::Result;

/// A storage backend for embedding records with similarity search.
///
/// Implementations manage named collections of [`EmbeddingRecord`]s,
/// support upserting (writing the same id twice overwrites), and answer
/// nearest-neighbor queries optionally scoped to one document id.
///
/// # Example
///
/// ```rust,ignore
/// use studymate_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.ensure_collection("document_embeddings", 1536).await?;
/// store.upsert("document_embeddings", &records).await?;
/// let matches = store.query("document_embeddings", &embedding, 5, Some("doc_1")).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection if it does not already exist.
    async fn ensure_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Upsert records into a collection. Id collisions overwrite.
    async fn upsert(&self, collection: &str, records: &[EmbeddingRecord]) -> Result<()>;

    /// Return up to `top_k` matches for the given embedding, best first.
    ///
    /// When `document_id` is set, candidates are restricted to records
    /// whose metadata carries that exact document id. Fewer than `top_k`
    /// candidates (including zero) is a valid result, never an error.
    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedMatch>>;
}
