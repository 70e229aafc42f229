//! HTTP error envelope for the StudyMate API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use studymate_rag::RagError;

/// The stable failure envelope every error response carries.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    /// Human-readable description of what failed.
    pub error: String,
    /// Lower-level diagnostic, when one is available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// An engine error carried to the HTTP boundary.
#[derive(Debug)]
pub struct ApiError(pub RagError);

impl From<RagError> for ApiError {
    fn from(error: RagError) -> Self {
        Self(error)
    }
}

impl ApiError {
    /// Map the error taxonomy to HTTP status codes: input validation is
    /// the caller's fault (400), upstream provider and malformed-payload
    /// failures are gateway trouble (502), everything else is internal.
    fn status(&self) -> StatusCode {
        match &self.0 {
            RagError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RagError::EmbeddingError { .. }
            | RagError::VectorStoreError { .. }
            | RagError::CompletionError { .. }
            | RagError::QuizFormat(_) => StatusCode::BAD_GATEWAY,
            RagError::ConfigError(_) | RagError::PipelineError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn summary(&self) -> &'static str {
        match &self.0 {
            RagError::InvalidInput(_) => "invalid request",
            RagError::EmbeddingError { .. } => "embedding provider failed",
            RagError::VectorStoreError { .. } => "vector store failed",
            RagError::CompletionError { .. } => "generation provider failed",
            RagError::QuizFormat(_) => "model returned malformed quiz output",
            RagError::ConfigError(_) => "server misconfiguration",
            RagError::PipelineError(_) => "pipeline failure",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.summary().to_string(),
            detail: Some(self.0.to_string()),
        };
        (self.status(), Json(body)).into_response()
    }
}
