//! Data types for documents, index entries, and query responses.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Metadata key holding the owning document's id on every index entry.
pub const DOCUMENT_ID_KEY: &str = "document_id";

/// Metadata key holding the 0-based position of a chunk within its document.
pub const CHUNK_INDEX_KEY: &str = "chunk_index";

/// A scalar metadata value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MetadataValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    String(String),
}

impl MetadataValue {
    /// Borrow the value as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetadataValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Return the value as an integer, if it is one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MetadataValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Int(i) => write!(f, "{i}"),
            MetadataValue::Float(x) => write!(f, "{x}"),
            MetadataValue::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

/// Key-value metadata attached to documents and index entries.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Derive the id of the `index`-th chunk of a document.
pub fn chunk_id(document_id: &str, index: usize) -> String {
    format!("{document_id}_chunk_{index}")
}

/// A source document submitted for indexing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Caller-supplied identifier, unique per logical document.
    pub id: String,
    /// The raw text content.
    pub content: String,
    /// Metadata copied onto every chunk of the document.
    #[serde(default)]
    pub metadata: Metadata,
}

/// One persisted chunk: id, vector, text and metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    /// `{document_id}_chunk_{index}`.
    pub id: String,
    /// The chunk text.
    pub text: String,
    /// The embedding of `text`.
    pub embedding: Vec<f32>,
    /// Document metadata merged with `document_id` and `chunk_index`.
    pub metadata: Metadata,
}

impl IndexEntry {
    /// The owning document's id, read from the entry metadata.
    pub fn document_id(&self) -> Option<&str> {
        self.metadata.get(DOCUMENT_ID_KEY).and_then(MetadataValue::as_str)
    }
}

/// A nearest-neighbour match returned by a vector store search.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexMatch {
    /// The id of the matched chunk.
    pub chunk_id: String,
    /// The chunk text.
    pub text: String,
    /// The chunk metadata.
    pub metadata: Metadata,
    /// Cosine distance to the query, in `[0, 2]` (0 = identical).
    pub distance: f32,
}

impl IndexMatch {
    /// The owning document's id, read from the match metadata.
    pub fn document_id(&self) -> Option<&str> {
        self.metadata.get(DOCUMENT_ID_KEY).and_then(MetadataValue::as_str)
    }
}

/// A retrieved chunk cited as a source for an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceChunk {
    /// The document the chunk belongs to.
    pub document_id: String,
    /// The chunk text that was supplied as context.
    pub chunk_text: String,
    /// Relevance in `[0, 1]`, rounded to 4 decimals.
    pub relevance_score: f64,
    /// The chunk metadata, including `chunk_index`.
    pub metadata: Metadata,
}

/// The answer to a question with its cited sources.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    /// The generated (or fixed fallback) answer.
    pub answer: String,
    /// Sources in ranked order, nearest first.
    pub sources: Vec<SourceChunk>,
    /// Distinct document ids among the sources, in ranked order.
    pub document_ids_searched: Vec<String>,
}

/// Overall service health.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every dependency is reachable.
    Healthy,
    /// At least one dependency is unreachable.
    Degraded,
    /// The service cannot serve requests.
    Unhealthy,
}

/// Reachability of the pipeline's dependencies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthReport {
    /// Overall status derived from the two reachability flags.
    pub status: HealthStatus,
    /// Whether the embedding service answered.
    #[serde(rename = "ollama_connected")]
    pub embedding_connected: bool,
    /// Whether the vector store is accessible.
    #[serde(rename = "chromadb_connected")]
    pub vector_store_connected: bool,
    /// Models reported by the embedding service.
    pub models_available: Vec<String>,
}

impl HealthReport {
    /// Build a report, deriving the status from the reachability flags.
    pub fn new(
        embedding_connected: bool,
        vector_store_connected: bool,
        models_available: Vec<String>,
    ) -> Self {
        let status = if embedding_connected && vector_store_connected {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        Self { status, embedding_connected, vector_store_connected, models_available }
    }

    /// The report served before the pipeline has been constructed.
    pub fn unhealthy() -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            embedding_connected: false,
            vector_store_connected: false,
            models_available: Vec::new(),
        }
    }
}
