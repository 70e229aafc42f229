//! Configuration for the retrieval pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the retrieval pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Collection name in the vector store.
    pub collection: String,
    /// Number of top results to retrieve per query.
    pub top_k: usize,
    /// Maximum number of citations attached to an answer.
    pub max_citations: usize,
    /// Maximum number of embedding requests in flight during ingestion.
    pub embed_concurrency: usize,
    /// Sampling temperature for grounded answers.
    pub answer_temperature: f32,
    /// Output token cap for grounded answers.
    pub answer_max_tokens: u32,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            collection: "document_embeddings".to_string(),
            top_k: 5,
            max_citations: 3,
            embed_concurrency: 8,
            answer_temperature: 0.3,
            answer_max_tokens: 1024,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the vector store collection name.
    pub fn collection(mut self, name: impl Into<String>) -> Self {
        self.config.collection = name.into();
        self
    }

    /// Set the number of top results to retrieve per query.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the maximum number of citations attached to an answer.
    pub fn max_citations(mut self, n: usize) -> Self {
        self.config.max_citations = n;
        self
    }

    /// Set the maximum number of in-flight embedding requests.
    pub fn embed_concurrency(mut self, n: usize) -> Self {
        self.config.embed_concurrency = n;
        self
    }

    /// Set the answer sampling temperature.
    pub fn answer_temperature(mut self, temperature: f32) -> Self {
        self.config.answer_temperature = temperature;
        self
    }

    /// Set the answer output token cap.
    pub fn answer_max_tokens(mut self, max_tokens: u32) -> Self {
        self.config.answer_max_tokens = max_tokens;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k`, `embed_concurrency`,
    /// or the collection name is zero/empty, or if `max_citations`
    /// exceeds `top_k`.
    pub fn build(self) -> Result<RagConfig> {
        if self.config.collection.is_empty() {
            return Err(RagError::ConfigError("collection name must not be empty".to_string()));
        }
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.config.embed_concurrency == 0 {
            return Err(RagError::ConfigError(
                "embed_concurrency must be greater than zero".to_string(),
            ));
        }
        if self.config.max_citations > self.config.top_k {
            return Err(RagError::ConfigError(format!(
                "max_citations ({}) must not exceed top_k ({})",
                self.config.max_citations, self.config.top_k
            )));
        }
        Ok(self.config)
    }
}
