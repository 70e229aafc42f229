//! Error types for the `studymate-rag` crate.

use thiserror::Error;

/// Errors that can occur in the retrieval and quiz engine.
#[derive(Debug, Error)]
pub enum RagError {
    /// Caller-supplied input was rejected before any external call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during answer or quiz generation.
    #[error("Completion error ({provider}): {message}")]
    CompletionError {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The completion call succeeded but its payload violated the quiz
    /// contract. Distinct from [`RagError::CompletionError`] so callers can
    /// decide whether to retry with a different truncation window.
    #[error("Quiz output error: {0}")]
    QuizFormat(#[from] QuizFormatError),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

/// The distinct ways a generative model's quiz payload can violate the
/// expected structure. Each reason is surfaced separately rather than
/// collapsed into one generic failure.
#[derive(Debug, Error)]
pub enum QuizFormatError {
    /// The model returned no content at all.
    #[error("model returned empty output")]
    EmptyOutput,

    /// The output was not parseable as JSON even after fence stripping.
    #[error("model output is not valid JSON: {0}")]
    InvalidJson(String),

    /// The output parsed to an empty array.
    #[error("model returned an empty question array")]
    EmptyArray,

    /// A specific question failed structural validation.
    #[error("question {index} is invalid: {reason}")]
    InvalidQuestion {
        /// Zero-based position of the offending question in the array.
        index: usize,
        /// What the question violated.
        reason: String,
    },
}

/// A convenience result type for engine operations.
pub type Result<T> = std::result::Result<T, RagError>;
