//! StudyMate API server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use studymate_rag::chroma::{ChromaConfig, ChromaVectorStore};
use studymate_rag::openai::{OpenAIChatProvider, OpenAIEmbeddingProvider};
use studymate_rag::{
    InMemoryAttemptStore, InMemoryVectorStore, PageAwareChunker, QuizGenerator, RagPipeline,
    VectorStore,
};
use studymate_server::{AppState, ServerConfig, router};
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Requests that outlive this are aborted at the HTTP boundary rather
/// than hanging on an upstream call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = ServerConfig::from_env().context("failed to load server configuration")?;

    let embedder = Arc::new(
        OpenAIEmbeddingProvider::new(config.openai_api_key.clone())?
            .with_model(config.embedding_model.clone(), config.embedding_dimensions),
    );
    let chat = Arc::new(
        OpenAIChatProvider::new(config.openai_api_key.clone())?
            .with_model(config.chat_model.clone()),
    );

    // Chroma when configured, in-memory otherwise.
    let store: Arc<dyn VectorStore> = match ChromaConfig::from_env() {
        Ok(chroma) => {
            info!(url = %chroma.url, "using Chroma vector store");
            Arc::new(ChromaVectorStore::new(chroma))
        }
        Err(_) => {
            info!("CHROMA_URL not set, using in-memory vector store");
            Arc::new(InMemoryVectorStore::new())
        }
    };

    let pipeline = Arc::new(
        RagPipeline::builder()
            .config(config.rag.clone())
            .embedding_provider(embedder)
            .vector_store(store)
            .completion_provider(chat.clone())
            .build()?,
    );
    pipeline.ensure_collection().await?;

    let state = AppState {
        pipeline,
        chunker: PageAwareChunker::default(),
        quiz: Arc::new(QuizGenerator::new(chat)),
        attempts: Arc::new(InMemoryAttemptStore::new()),
    };

    let app = router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    info!(addr = %config.bind_addr, "studymate server listening");

    axum::serve(listener, app).await.context("server exited with an error")?;
    Ok(())
}
