//! Shared application state for route handlers.

use std::sync::Arc;

use studymate_rag::{AttemptStore, PageAwareChunker, QuizGenerator, RagPipeline};

/// Everything the route handlers need, cloned per request.
#[derive(Clone)]
pub struct AppState {
    /// The retrieval pipeline (ingest + answer).
    pub pipeline: Arc<RagPipeline>,
    /// The page-aware chunker exposed over `/chunk`.
    pub chunker: PageAwareChunker,
    /// The quiz generator.
    pub quiz: Arc<QuizGenerator>,
    /// Append-only quiz attempt storage.
    pub attempts: Arc<dyn AttemptStore>,
}
