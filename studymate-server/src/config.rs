//! Server configuration read from the environment.

use studymate_rag::{RagConfig, RagError, Result};

/// Default bind address.
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Default embedding model and its dimensionality.
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;

/// Default chat model for answers and quizzes.
const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Everything the server needs to wire up providers and listen.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub bind_addr: String,
    /// OpenAI API key for embeddings and completions.
    pub openai_api_key: String,
    /// Embedding model identifier. Changing it invalidates the existing
    /// index; the dimensionality must match what was used at ingestion.
    pub embedding_model: String,
    /// Dimensionality of the embedding model.
    pub embedding_dimensions: usize,
    /// Chat model identifier.
    pub chat_model: String,
    /// Pipeline configuration (collection name, top_k, concurrency).
    pub rag: RagConfig,
}

impl ServerConfig {
    /// Read configuration from the environment.
    ///
    /// `OPENAI_API_KEY` is required. `STUDYMATE_BIND_ADDR`,
    /// `STUDYMATE_EMBEDDING_MODEL`, `STUDYMATE_EMBEDDING_DIMENSIONS`,
    /// `STUDYMATE_CHAT_MODEL`, and `STUDYMATE_COLLECTION` override the
    /// defaults. Chroma settings are read separately by
    /// [`studymate_rag::chroma::ChromaConfig::from_env`].
    pub fn from_env() -> Result<Self> {
        let openai_api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::ConfigError("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let embedding_dimensions = match std::env::var("STUDYMATE_EMBEDDING_DIMENSIONS") {
            Ok(raw) => raw.parse().map_err(|_| {
                RagError::ConfigError(format!(
                    "STUDYMATE_EMBEDDING_DIMENSIONS is not a number: {raw}"
                ))
            })?,
            Err(_) => DEFAULT_EMBEDDING_DIMENSIONS,
        };

        let mut rag_builder = RagConfig::builder();
        if let Ok(collection) = std::env::var("STUDYMATE_COLLECTION") {
            rag_builder = rag_builder.collection(collection);
        }

        Ok(Self {
            bind_addr: std::env::var("STUDYMATE_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            openai_api_key,
            embedding_model: std::env::var("STUDYMATE_EMBEDDING_MODEL")
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            embedding_dimensions,
            chat_model: std::env::var("STUDYMATE_CHAT_MODEL")
                .unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
            rag: rag_builder.build()?,
        })
    }
}
