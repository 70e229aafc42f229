//! Chroma vector store backend.
//!
//! Provides [`ChromaVectorStore`], a [`VectorStore`] implementation that
//! talks to a Chroma server over its REST API with `reqwest`. Collections
//! are addressed within a tenant/database namespace and resolved to their
//! server-side ids on first use.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, error};

use crate::document::{ChunkMetadata, EmbeddingRecord, RetrievedMatch};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Connection settings for a Chroma server.
#[derive(Debug, Clone)]
pub struct ChromaConfig {
    /// Base URL of the Chroma server, e.g. `https://api.trychroma.com`.
    pub url: String,
    /// API token, sent as `X-Chroma-Token`. Empty disables auth.
    pub api_key: String,
    /// Tenant namespace.
    pub tenant: String,
    /// Database namespace within the tenant.
    pub database: String,
}

impl ChromaConfig {
    /// Read connection settings from `CHROMA_URL`, `CHROMA_API_KEY`,
    /// `CHROMA_TENANT`, and `CHROMA_DATABASE`. Tenant and database default
    /// to Chroma's own defaults when unset.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var("CHROMA_URL").map_err(|_| {
            RagError::ConfigError("CHROMA_URL environment variable not set".to_string())
        })?;
        Ok(Self {
            url,
            api_key: std::env::var("CHROMA_API_KEY").unwrap_or_default(),
            tenant: std::env::var("CHROMA_TENANT").unwrap_or_else(|_| "default_tenant".into()),
            database: std::env::var("CHROMA_DATABASE")
                .unwrap_or_else(|_| "default_database".into()),
        })
    }
}

/// A [`VectorStore`] backed by [Chroma](https://www.trychroma.com/).
///
/// Records are stored with their full text as the Chroma document and
/// their [`ChunkMetadata`] as the payload, so document-scoped queries can
/// filter with a `where` equality clause. Upserts overwrite on id
/// collision, which gives re-ingestion its supersede semantics.
pub struct ChromaVectorStore {
    client: reqwest::Client,
    config: ChromaConfig,
    /// Collection name → server-side collection id.
    collection_ids: RwLock<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct CollectionResponse {
    id: String,
}

#[derive(Serialize)]
struct UpsertBody<'a> {
    ids: Vec<&'a str>,
    embeddings: Vec<&'a [f32]>,
    documents: Vec<&'a str>,
    metadatas: Vec<&'a ChunkMetadata>,
}

#[derive(Deserialize)]
struct QueryResponse {
    documents: Vec<Vec<String>>,
    metadatas: Vec<Vec<Value>>,
    distances: Vec<Vec<f32>>,
}

impl ChromaVectorStore {
    /// Create a new store for the given connection settings.
    pub fn new(config: ChromaConfig) -> Self {
        Self { client: reqwest::Client::new(), config, collection_ids: RwLock::new(HashMap::new()) }
    }

    fn map_err(message: impl Into<String>) -> RagError {
        RagError::VectorStoreError { backend: "Chroma".to_string(), message: message.into() }
    }

    fn collections_url(&self) -> String {
        format!(
            "{}/api/v2/tenants/{}/databases/{}/collections",
            self.config.url, self.config.tenant, self.config.database
        )
    }

    fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        let mut builder = self.client.request(method, url);
        if !self.config.api_key.is_empty() {
            builder = builder.header("X-Chroma-Token", &self.config.api_key);
        }
        builder
    }

    /// Send a request and decode the response, mapping transport and API
    /// failures into [`RagError::VectorStoreError`].
    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<T> {
        let response = builder.send().await.map_err(|e| {
            error!(backend = "Chroma", error = %e, context, "request failed");
            Self::map_err(format!("{context}: request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = "Chroma", %status, context, "API error");
            return Err(Self::map_err(format!("{context}: API returned {status}: {body}")));
        }

        response.json().await.map_err(|e| {
            error!(backend = "Chroma", error = %e, context, "failed to parse response");
            Self::map_err(format!("{context}: failed to parse response: {e}"))
        })
    }

    /// Send a request where only the status matters; the body is dropped.
    async fn send_unit(&self, builder: reqwest::RequestBuilder, context: &str) -> Result<()> {
        let response = builder.send().await.map_err(|e| {
            error!(backend = "Chroma", error = %e, context, "request failed");
            Self::map_err(format!("{context}: request failed: {e}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(backend = "Chroma", %status, context, "API error");
            return Err(Self::map_err(format!("{context}: API returned {status}: {body}")));
        }

        Ok(())
    }

    /// Resolve a collection name to its server-side id, creating the
    /// collection on first use.
    async fn collection_id(&self, name: &str) -> Result<String> {
        if let Some(id) = self.collection_ids.read().await.get(name) {
            return Ok(id.clone());
        }

        let body = json!({ "name": name, "get_or_create": true });
        let created: CollectionResponse = self
            .send(
                self.request(reqwest::Method::POST, &self.collections_url()).json(&body),
                "get_or_create collection",
            )
            .await?;

        debug!(backend = "Chroma", collection = name, id = %created.id, "resolved collection");
        self.collection_ids.write().await.insert(name.to_string(), created.id.clone());
        Ok(created.id)
    }

    /// Decode one metadata payload back into [`ChunkMetadata`].
    fn decode_metadata(value: &Value) -> Result<ChunkMetadata> {
        serde_json::from_value(value.clone())
            .map_err(|e| Self::map_err(format!("malformed metadata payload: {e}")))
    }
}

#[async_trait]
impl VectorStore for ChromaVectorStore {
    async fn ensure_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        self.collection_id(name).await.map(|_| ())
    }

    async fn upsert(&self, collection: &str, records: &[EmbeddingRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let id = self.collection_id(collection).await?;
        let url = format!("{}/{}/upsert", self.collections_url(), id);

        let body = UpsertBody {
            ids: records.iter().map(|r| r.id.as_str()).collect(),
            embeddings: records.iter().map(|r| r.embedding.as_slice()).collect(),
            documents: records.iter().map(|r| r.document_text.as_str()).collect(),
            metadatas: records.iter().map(|r| &r.metadata).collect(),
        };

        self.send_unit(self.request(reqwest::Method::POST, &url).json(&body), "upsert").await?;

        debug!(backend = "Chroma", collection, record_count = records.len(), "upserted records");
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        embedding: &[f32],
        top_k: usize,
        document_id: Option<&str>,
    ) -> Result<Vec<RetrievedMatch>> {
        let id = self.collection_id(collection).await?;
        let url = format!("{}/{}/query", self.collections_url(), id);

        let mut body = json!({
            "query_embeddings": [embedding],
            "n_results": top_k,
            "include": ["documents", "metadatas", "distances"],
        });
        if let Some(document_id) = document_id {
            body["where"] = json!({ "documentId": document_id });
        }

        let parsed: QueryResponse =
            self.send(self.request(reqwest::Method::POST, &url).json(&body), "query").await?;

        // One query embedding in, one result row out.
        let documents = parsed.documents.into_iter().next().unwrap_or_default();
        let metadatas = parsed.metadatas.into_iter().next().unwrap_or_default();
        let distances = parsed.distances.into_iter().next().unwrap_or_default();

        let mut matches = Vec::with_capacity(documents.len());
        for (rank, ((text, metadata), distance)) in
            documents.into_iter().zip(metadatas).zip(distances).enumerate()
        {
            let metadata = Self::decode_metadata(&metadata)?;
            matches.push(RetrievedMatch {
                chunk_text: text,
                page_number: metadata.page_number,
                rank,
                // Chroma reports cosine distance; invert so higher is better.
                score: 1.0 - distance,
            });
        }

        debug!(backend = "Chroma", collection, result_count = matches.len(), "query completed");
        Ok(matches)
    }
}
