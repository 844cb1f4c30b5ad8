//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{IndexMatch, Metadata};
use crate::error::Result;

/// A storage backend for chunk embeddings with nearest-neighbour search.
///
/// Entries are grouped by the `document_id` in their metadata. Entries are
/// never updated in place: replacing a document's chunks is always
/// [`delete_document`](VectorStore::delete_document) followed by
/// [`upsert_chunks`](VectorStore::upsert_chunks), sequenced by the caller.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.upsert_chunks("doc-1", &chunks, &embeddings, &metadata).await?;
/// let matches = store.search(&query_embedding, 3, &[]).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Store one entry per chunk with id `{document_id}_chunk_{i}`.
    ///
    /// Each entry's metadata is `metadata` plus `document_id` and
    /// `chunk_index`; the document-supplied map cannot override those two
    /// keys. Returns the number of entries written.
    ///
    /// # Errors
    ///
    /// Fails before anything is written when `chunks` and `embeddings` differ
    /// in length, or with [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// when an embedding's dimension differs from the index's.
    async fn upsert_chunks(
        &self,
        document_id: &str,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        metadata: &Metadata,
    ) -> Result<usize>;

    /// Return up to `top_k` entries nearest to `embedding` by cosine distance,
    /// nearest first.
    ///
    /// When `document_ids` is non-empty only entries of those documents are
    /// considered. An empty index or an empty filter match yields an empty
    /// list, never an error.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        document_ids: &[String],
    ) -> Result<Vec<IndexMatch>>;

    /// Delete every entry of `document_id` and return how many were removed.
    async fn delete_document(&self, document_id: &str) -> Result<usize>;

    /// All document ids present in the index, sorted and de-duplicated.
    async fn list_document_ids(&self) -> Result<Vec<String>>;

    /// Whether the store is accessible. Never fails.
    async fn check_connection(&self) -> bool;
}
