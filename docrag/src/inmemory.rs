//! In-memory vector store using cosine distance, with optional persistence.
//!
//! [`InMemoryVectorStore`] keeps every entry in a `BTreeMap` protected by a
//! `tokio::sync::RwLock`. Search is an exact scan, which is adequate for the
//! document counts a single service instance handles. When opened with
//! [`InMemoryVectorStore::open`], the whole index is written to
//! `{dir}/index.json` after every mutation and reloaded on the next start.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{
    CHUNK_INDEX_KEY, DOCUMENT_ID_KEY, IndexEntry, IndexMatch, Metadata, MetadataValue, chunk_id,
};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

const BACKEND: &str = "InMemory";

/// File name of the persisted index inside the persistence directory.
pub const SNAPSHOT_FILE: &str = "index.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct IndexState {
    /// Established by the first write; cleared when the index empties.
    dimension: Option<usize>,
    entries: BTreeMap<String, IndexEntry>,
}

/// An in-memory vector store using cosine distance for search.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::open("./vector_data").await?;
/// let count = store.upsert_chunks("doc-1", &chunks, &embeddings, &metadata).await?;
/// ```
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    state: RwLock<IndexState>,
    persist_dir: Option<PathBuf>,
}

impl InMemoryVectorStore {
    /// Create a new empty store that lives only in memory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a persistent store rooted at `dir`, creating the directory if
    /// needed and loading any previously saved index.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the directory cannot be
    /// created or the saved index cannot be read or parsed.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            store_error(format!("cannot create directory '{}': {e}", dir.display()))
        })?;

        let path = dir.join(SNAPSHOT_FILE);
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<IndexState>(&bytes).map_err(|e| {
                store_error(format!("corrupt index file '{}': {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexState::default(),
            Err(e) => {
                return Err(store_error(format!("cannot read '{}': {e}", path.display())));
            }
        };

        info!(
            path = %dir.display(),
            entries = state.entries.len(),
            dimension = ?state.dimension,
            "opened vector store"
        );
        Ok(Self { state: RwLock::new(state), persist_dir: Some(dir) })
    }

    /// Number of stored entries.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    /// Whether the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// The vector dimension established by the stored entries, if any.
    pub async fn dimension(&self) -> Option<usize> {
        self.state.read().await.dimension
    }

    /// Run `mutate` under the write lock and persist the result.
    ///
    /// `mutate` returns its output and whether it changed anything. If
    /// persisting fails the in-memory state is rolled back.
    async fn apply<T>(
        &self,
        mutate: impl FnOnce(&mut IndexState) -> Result<(T, bool)>,
    ) -> Result<T> {
        let mut state = self.state.write().await;
        let previous = self.persist_dir.as_ref().map(|_| state.clone());

        let (output, changed) = mutate(&mut *state)?;

        if let (Some(dir), Some(previous), true) = (&self.persist_dir, previous, changed) {
            if let Err(e) = write_snapshot(dir, &*state).await {
                error!(path = %dir.display(), error = %e, "failed to persist vector store");
                *state = previous;
                return Err(e);
            }
        }
        Ok(output)
    }
}

fn store_error(message: String) -> RagError {
    RagError::VectorStoreError { backend: BACKEND.to_string(), message }
}

async fn write_snapshot(dir: &Path, state: &IndexState) -> Result<()> {
    let bytes = serde_json::to_vec(state)
        .map_err(|e| store_error(format!("cannot serialize index: {e}")))?;
    let tmp = dir.join(format!("{SNAPSHOT_FILE}.tmp"));
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| store_error(format!("cannot write '{}': {e}", tmp.display())))?;
    tokio::fs::rename(&tmp, dir.join(SNAPSHOT_FILE))
        .await
        .map_err(|e| store_error(format!("cannot replace index file: {e}")))?;
    Ok(())
}

/// Cosine distance in `[0, 2]`. Vectors with zero magnitude are at distance 1
/// from everything, as is any pair whose distance is not finite.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    let dot: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }
    let distance = 1.0 - dot / (norm_a * norm_b);
    if !distance.is_finite() {
        return 1.0;
    }
    distance.clamp(0.0, 2.0) as f32
}

/// Check every embedding against the established (or first) dimension.
fn validate_embeddings(established: Option<usize>, embeddings: &[Vec<f32>]) -> Result<usize> {
    let expected = established.unwrap_or_else(|| embeddings[0].len());
    if expected == 0 {
        return Err(store_error("embeddings must not be empty".to_string()));
    }
    for embedding in embeddings {
        if embedding.len() != expected {
            return Err(RagError::DimensionMismatch { expected, actual: embedding.len() });
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(store_error("embedding contains non-finite values".to_string()));
        }
    }
    Ok(expected)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn upsert_chunks(
        &self,
        document_id: &str,
        chunks: &[String],
        embeddings: &[Vec<f32>],
        metadata: &Metadata,
    ) -> Result<usize> {
        if chunks.len() != embeddings.len() {
            return Err(store_error(format!(
                "got {} chunks but {} embeddings for document '{document_id}'",
                chunks.len(),
                embeddings.len()
            )));
        }
        if chunks.is_empty() {
            return Ok(0);
        }

        let count = self
            .apply(|state| {
                let dimension = validate_embeddings(state.dimension, embeddings)?;

                for (i, (text, embedding)) in chunks.iter().zip(embeddings).enumerate() {
                    let mut entry_metadata = metadata.clone();
                    entry_metadata.insert(DOCUMENT_ID_KEY.to_string(), document_id.into());
                    entry_metadata
                        .insert(CHUNK_INDEX_KEY.to_string(), MetadataValue::Int(i as i64));

                    let id = chunk_id(document_id, i);
                    state.entries.insert(
                        id.clone(),
                        IndexEntry {
                            id,
                            text: text.clone(),
                            embedding: embedding.clone(),
                            metadata: entry_metadata,
                        },
                    );
                }
                state.dimension = Some(dimension);
                Ok((chunks.len(), true))
            })
            .await?;

        debug!(document_id, count, "stored chunks");
        Ok(count)
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        document_ids: &[String],
    ) -> Result<Vec<IndexMatch>> {
        let state = self.state.read().await;
        if state.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }
        if let Some(expected) = state.dimension {
            if embedding.len() != expected {
                return Err(RagError::DimensionMismatch { expected, actual: embedding.len() });
            }
        }
        if embedding.iter().any(|x| !x.is_finite()) {
            return Err(store_error("query embedding contains non-finite values".to_string()));
        }

        let filter: HashSet<&str> = document_ids.iter().map(String::as_str).collect();
        let mut scored: Vec<(f32, &IndexEntry)> = state
            .entries
            .values()
            .filter(|entry| {
                filter.is_empty() || entry.document_id().is_some_and(|id| filter.contains(id))
            })
            .map(|entry| (cosine_distance(&entry.embedding, embedding), entry))
            .collect();

        scored.sort_by(|a, b| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.1.id.cmp(&b.1.id))
        });
        scored.truncate(top_k);

        let matches: Vec<IndexMatch> = scored
            .into_iter()
            .map(|(distance, entry)| IndexMatch {
                chunk_id: entry.id.clone(),
                text: entry.text.clone(),
                metadata: entry.metadata.clone(),
                distance,
            })
            .collect();

        debug!(top_k, filter = ?document_ids, result_count = matches.len(), "searched vector store");
        Ok(matches)
    }

    async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let count = self
            .apply(|state| {
                let before = state.entries.len();
                state.entries.retain(|_, entry| entry.document_id() != Some(document_id));
                let removed = before - state.entries.len();
                if state.entries.is_empty() {
                    state.dimension = None;
                }
                Ok((removed, removed > 0))
            })
            .await?;

        if count > 0 {
            debug!(document_id, count, "deleted chunks");
        } else {
            debug!(document_id, "no chunks found for document");
        }
        Ok(count)
    }

    async fn list_document_ids(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        let ids: BTreeSet<&str> =
            state.entries.values().filter_map(IndexEntry::document_id).collect();
        Ok(ids.into_iter().map(str::to_string).collect())
    }

    async fn check_connection(&self) -> bool {
        match &self.persist_dir {
            Some(dir) => match tokio::fs::metadata(dir).await {
                Ok(meta) => meta.is_dir(),
                Err(e) => {
                    error!(path = %dir.display(), error = %e, "vector store health check failed");
                    false
                }
            },
            None => true,
        }
    }
}
