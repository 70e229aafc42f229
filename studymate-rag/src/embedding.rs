//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified
/// async interface. The adapter itself does no caching and no retrying;
/// batch fan-out and failure policy belong to the pipeline. An empty input
/// string is a typed failure, never a default vector.
///
/// # Example
///
/// ```rust,ignore
/// use studymate_rag::EmbeddingProvider;
///
/// let embedding = provider.embed("what is photosynthesis?").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    ///
    /// Must match the dimensionality used at ingestion time; changing the
    /// embedding model invalidates the existing index.
    fn dimensions(&self) -> usize;
}
