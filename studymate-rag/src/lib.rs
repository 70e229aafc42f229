//! Page-attributed retrieval, citation, and quiz engine for StudyMate.
//!
//! This crate turns an arbitrarily-parsed document into page-attributed,
//! retrievable chunks; embeds and indexes them; answers questions scoped
//! to one document with citations traceable to source pages; and derives
//! validated self-test quizzes from the same document.
//!
//! # Components
//!
//! - [`PageAwareChunker`] — parsed elements → fixed-size page-attributed chunks
//! - [`EmbeddingProvider`] — text → fixed-dimension vectors
//! - [`VectorStore`] — similarity search with document-id filtering
//!   ([`InMemoryVectorStore`], [`chroma::ChromaVectorStore`])
//! - [`RagPipeline`] — ingestion and grounded answering with citations
//! - [`QuizGenerator`] — structured quiz generation with validation/repair
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use studymate_rag::{PageAwareChunker, RagConfig, RagPipeline, InMemoryVectorStore};
//!
//! let chunks = PageAwareChunker::default().chunk_elements(&elements);
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(embedder)
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .completion_provider(chat)
//!     .build()?;
//! pipeline.ingest("doc_1", &chunks).await?;
//! let answer = pipeline.answer("what is on page 2?", Some("doc_1")).await?;
//! ```

pub mod attempts;
pub mod chroma;
pub mod chunking;
pub mod completion;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod inmemory;
pub mod openai;
pub mod pipeline;
pub mod quiz;
pub mod vectorstore;

pub use attempts::{AttemptStore, InMemoryAttemptStore};
pub use chunking::PageAwareChunker;
pub use completion::{CompletionProvider, CompletionRequest};
pub use config::RagConfig;
pub use document::{Chunk, ChunkMetadata, Citation, EmbeddingRecord, ParsedElement, RetrievedMatch};
pub use embedding::EmbeddingProvider;
pub use error::{QuizFormatError, RagError, Result};
pub use inmemory::InMemoryVectorStore;
pub use pipeline::{Answer, NO_MATCH_RESPONSE, RagPipeline, RagPipelineBuilder};
pub use quiz::{QuestionType, QuizAttempt, QuizGenerator, QuizQuestion, score_attempt};
pub use vectorstore::VectorStore;
