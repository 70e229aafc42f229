//! Append-only storage for quiz attempts.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::quiz::QuizAttempt;

/// Append-only persistence for [`QuizAttempt`]s.
///
/// Attempts are immutable once recorded; the durable backing store is an
/// external collaborator, so implementations only promise append and
/// per-document listing.
#[async_trait]
pub trait AttemptStore: Send + Sync {
    /// Record one attempt.
    async fn record(&self, attempt: QuizAttempt) -> Result<()>;

    /// List attempts for a document, newest first. A document with no
    /// attempts yields an empty list, not an error.
    async fn list_for_document(&self, document_id: &str) -> Result<Vec<QuizAttempt>>;
}

/// An in-memory [`AttemptStore`] for development and tests.
#[derive(Debug, Default)]
pub struct InMemoryAttemptStore {
    attempts: RwLock<Vec<QuizAttempt>>,
}

impl InMemoryAttemptStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptStore for InMemoryAttemptStore {
    async fn record(&self, attempt: QuizAttempt) -> Result<()> {
        self.attempts.write().await.push(attempt);
        Ok(())
    }

    async fn list_for_document(&self, document_id: &str) -> Result<Vec<QuizAttempt>> {
        let attempts = self.attempts.read().await;
        let mut matching: Vec<QuizAttempt> =
            attempts.iter().filter(|a| a.document_id == document_id).cloned().collect();
        matching.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{Duration, Utc};

    use super::*;

    fn attempt(document_id: &str, score: f32, age: Duration) -> QuizAttempt {
        QuizAttempt {
            document_id: document_id.to_string(),
            questions: Vec::new(),
            user_answers: HashMap::new(),
            score,
            timestamp: Utc::now() - age,
        }
    }

    #[tokio::test]
    async fn lists_newest_first_scoped_to_document() {
        let store = InMemoryAttemptStore::new();
        store.record(attempt("doc_a", 40.0, Duration::hours(2))).await.unwrap();
        store.record(attempt("doc_a", 80.0, Duration::hours(1))).await.unwrap();
        store.record(attempt("doc_b", 10.0, Duration::hours(0))).await.unwrap();

        let attempts = store.list_for_document("doc_a").await.unwrap();
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].score, 80.0);
        assert_eq!(attempts[1].score, 40.0);
    }

    #[tokio::test]
    async fn unknown_document_yields_empty_list() {
        let store = InMemoryAttemptStore::new();
        assert!(store.list_for_document("missing").await.unwrap().is_empty());
    }
}
