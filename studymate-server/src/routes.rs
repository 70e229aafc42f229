//! Route handlers for the StudyMate API.

use std::collections::HashMap;

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use studymate_rag::quiz::{DEFAULT_QUESTION_COUNT, QuizAttempt, QuizQuestion, score_attempt};
use studymate_rag::{Chunk, Citation, ParsedElement};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Build the API router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ingest", post(ingest))
        .route("/chunk", post(chunk))
        .route("/query", post(query))
        .route("/generate-quiz", post(generate_quiz))
        .route("/attempts", post(save_attempt).get(list_attempts))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ── Ingestion ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub document_id: String,
    pub chunks: Vec<Chunk>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub chunks_processed: usize,
}

async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<IngestRequest>,
) -> Result<Json<IngestResponse>, ApiError> {
    let processed = state.pipeline.ingest(&request.document_id, &request.chunks).await?;
    Ok(Json(IngestResponse { success: true, chunks_processed: processed }))
}

// ── Chunking ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRequest {
    pub document_id: String,
    pub elements: Vec<ParsedElement>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkResponse {
    pub success: bool,
    pub document_id: String,
    pub chunks: Vec<Chunk>,
}

async fn chunk(
    State(state): State<AppState>,
    Json(request): Json<ChunkRequest>,
) -> Json<ChunkResponse> {
    let chunks = state.chunker.chunk_elements(&request.elements);
    info!(document_id = %request.document_id, chunk_count = chunks.len(), "chunked elements");
    Json(ChunkResponse { success: true, document_id: request.document_id, chunks })
}

// ── Query ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub document_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub success: bool,
    pub response: String,
    pub citations: Vec<Citation>,
}

async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    let answer =
        state.pipeline.answer(&request.question, request.document_id.as_deref()).await?;
    Ok(Json(QueryResponse {
        success: true,
        response: answer.response,
        citations: answer.citations,
    }))
}

// ── Quiz generation ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuizRequest {
    pub content: String,
    #[serde(default = "default_question_count")]
    pub question_count: usize,
}

fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}

#[derive(Debug, Serialize)]
pub struct GenerateQuizResponse {
    pub success: bool,
    pub questions: Vec<QuizQuestion>,
    pub count: usize,
}

async fn generate_quiz(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuizRequest>,
) -> Result<Json<GenerateQuizResponse>, ApiError> {
    let questions = state.quiz.generate(&request.content, request.question_count).await?;
    let count = questions.len();
    Ok(Json(GenerateQuizResponse { success: true, questions, count }))
}

// ── Quiz attempts ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAttemptRequest {
    pub document_id: String,
    pub questions: Vec<QuizQuestion>,
    pub user_answers: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveAttemptResponse {
    pub success: bool,
    pub attempt: QuizAttempt,
}

async fn save_attempt(
    State(state): State<AppState>,
    Json(request): Json<SaveAttemptRequest>,
) -> Result<Json<SaveAttemptResponse>, ApiError> {
    let score = score_attempt(&request.questions, &request.user_answers);
    let attempt = QuizAttempt {
        document_id: request.document_id,
        questions: request.questions,
        user_answers: request.user_answers,
        score,
        timestamp: chrono::Utc::now(),
    };
    state.attempts.record(attempt.clone()).await?;
    info!(document_id = %attempt.document_id, score, "recorded quiz attempt");
    Ok(Json(SaveAttemptResponse { success: true, attempt }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAttemptsQuery {
    pub document_id: String,
}

#[derive(Debug, Serialize)]
pub struct ListAttemptsResponse {
    pub success: bool,
    pub attempts: Vec<QuizAttempt>,
}

async fn list_attempts(
    State(state): State<AppState>,
    Query(params): Query<ListAttemptsQuery>,
) -> Result<Json<ListAttemptsResponse>, ApiError> {
    let attempts = state.attempts.list_for_document(&params.document_id).await?;
    Ok(Json(ListAttemptsResponse { success: true, attempts }))
}
