//! HTTP surface for the StudyMate retrieval and quiz engine.
//!
//! Exposes the [`studymate_rag`] pipeline as a JSON API: ingestion,
//! chunking, document-scoped question answering with citations, quiz
//! generation, and quiz-attempt recording.

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::router;
pub use state::AppState;
