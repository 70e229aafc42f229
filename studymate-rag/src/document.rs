//! Data types for parsed elements, chunks, embedding records, and citations.

use serde::{Deserialize, Serialize};

/// Maximum number of characters kept in a citation quote before truncation.
pub const CITATION_QUOTE_LIMIT: usize = 150;

/// Maximum number of characters kept in a record's text preview.
pub const TEXT_PREVIEW_LIMIT: usize = 500;

/// A text element produced by the external document parser.
///
/// Page numbers may be absent in the parser's output; the chunker defaults
/// them from the element's ordinal position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ParsedElement {
    /// The element's text content.
    pub text: String,
    /// The 1-based page the element appears on, when the parser reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_number: Option<u32>,
    /// The parser's element classification (e.g. `NarrativeText`, `Title`).
    #[serde(default)]
    pub element_type: String,
}

/// A bounded, page-attributed slice of document text — the unit of
/// embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// The chunk's text, non-empty after trimming.
    pub text: String,
    /// The 1-based page this chunk was sliced from. Chunks never span pages.
    pub page_number: u32,
    /// Position in the document's global chunk sequence. Monotonic and
    /// unique within a document.
    pub chunk_index: usize,
}

/// Metadata attached to an [`EmbeddingRecord`], used for document-scoped
/// filtering and citation derivation at query time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChunkMetadata {
    /// The owning document's identifier.
    pub document_id: String,
    /// The chunk's global index within the document.
    pub chunk_index: usize,
    /// The page the chunk was sliced from.
    pub page_number: u32,
    /// The first [`TEXT_PREVIEW_LIMIT`] characters of the chunk text.
    pub text_preview: String,
}

/// A chunk prepared for the vector index: deterministic id, embedding,
/// full text, and filterable metadata.
///
/// The id is `{document_id}_chunk_{chunk_index}`, so re-ingesting the same
/// document with the same chunking produces identical ids and upserts
/// overwrite rather than duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmbeddingRecord {
    /// Deterministic record id.
    pub id: String,
    /// The embedding vector for the chunk text.
    pub embedding: Vec<f32>,
    /// The full chunk text as stored in the index.
    pub document_text: String,
    /// Filterable metadata.
    pub metadata: ChunkMetadata,
}

impl EmbeddingRecord {
    /// Derive the deterministic record id for a chunk of a document.
    pub fn record_id(document_id: &str, chunk_index: usize) -> String {
        format!("{document_id}_chunk_{chunk_index}")
    }

    /// Build a record from a chunk and its embedding.
    pub fn from_chunk(document_id: &str, chunk: &Chunk, embedding: Vec<f32>) -> Self {
        Self {
            id: Self::record_id(document_id, chunk.chunk_index),
            embedding,
            document_text: chunk.text.clone(),
            metadata: ChunkMetadata {
                document_id: document_id.to_string(),
                chunk_index: chunk.chunk_index,
                page_number: chunk.page_number,
                text_preview: truncate_chars(&chunk.text, TEXT_PREVIEW_LIMIT).to_string(),
            },
        }
    }
}

/// A retrieved chunk paired with its rank and backend similarity score.
/// Request-scoped; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrievedMatch {
    /// The full text of the retrieved chunk.
    pub chunk_text: String,
    /// The page the chunk was sliced from.
    pub page_number: u32,
    /// Zero-based retrieval rank, best match first.
    pub rank: usize,
    /// Backend similarity score (higher is more relevant).
    pub score: f32,
}

/// A (page, truncated quote) pair traceable to a retrieved chunk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Citation {
    /// The page the quoted chunk was sliced from.
    pub page: u32,
    /// The chunk text, truncated to [`CITATION_QUOTE_LIMIT`] characters
    /// with a trailing `...` iff truncation occurred.
    pub quote: String,
}

impl Citation {
    /// Derive a citation from a retrieved match.
    pub fn from_match(m: &RetrievedMatch) -> Self {
        let quote = if m.chunk_text.chars().count() > CITATION_QUOTE_LIMIT {
            format!("{}...", truncate_chars(&m.chunk_text, CITATION_QUOTE_LIMIT))
        } else {
            m.chunk_text.clone()
        };
        Self { page: m.page_number, quote }
    }
}

/// Truncate a string to at most `limit` characters, respecting char
/// boundaries. Returns the whole string when it is short enough.
pub(crate) fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
