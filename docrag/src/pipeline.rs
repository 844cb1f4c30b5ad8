//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] coordinates the index, query and delete workflows by
//! composing an [`EmbeddingProvider`], a [`VectorStore`], an
//! [`AnswerGenerator`] and a [`Chunker`]. It owns the relevance-scoring and
//! context-assembly policy and serialises mutations per document.
//!
//! # Example
//!
//! ```rust,ignore
//! use docrag::{InMemoryVectorStore, RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .generator(Arc::new(generator))
//!     .build()?;
//!
//! pipeline.index_document(&document).await?;
//! let response = pipeline.query("What does the policy cover?", &[], None).await?;
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::{Document, HealthReport, IndexMatch, QueryResponse, SourceChunk};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{AnswerGenerator, assemble_context, build_prompt};
use crate::locks::DocumentLocks;
use crate::vectorstore::VectorStore;

/// Answer returned when no chunk matches the question.
pub const NO_RESULTS_ANSWER: &str =
    "No relevant documents found to answer this question. Please index some documents first.";

/// Convert a cosine distance in `[0, 2]` into a relevance score in `[0, 1]`,
/// rounded to 4 decimals.
pub fn relevance_score(distance: f32) -> f64 {
    let relevance = (1.0 - f64::from(distance) / 2.0).clamp(0.0, 1.0);
    (relevance * 10_000.0).round() / 10_000.0
}

/// The RAG pipeline orchestrator.
///
/// Stateless between calls apart from the per-document lock table.
/// Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    generator: Arc<dyn AnswerGenerator>,
    chunker: Arc<dyn Chunker>,
    locks: DocumentLocks,
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the embedding provider.
    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.embedding_provider
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.vector_store
    }

    /// Index a document: delete old chunks → chunk → embed → store.
    ///
    /// Re-indexing an id replaces its chunks. Returns the number of chunks
    /// stored, which is 0 for content that produces no chunks.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ValidationError`] for a blank id or empty content.
    /// Any dependency failure aborts the operation and leaves the document
    /// with no chunks.
    pub async fn index_document(&self, document: &Document) -> Result<usize> {
        if document.id.trim().is_empty() {
            return Err(RagError::ValidationError("document_id must not be empty".to_string()));
        }
        if document.content.is_empty() {
            return Err(RagError::ValidationError("content must not be empty".to_string()));
        }

        let _guard = self.locks.acquire(&document.id).await;

        // 1. Remove the previous generation, if any
        let replaced = self.vector_store.delete_document(&document.id).await.inspect_err(|e| {
            error!(document.id = %document.id, error = %e, "delete failed during indexing");
        })?;

        // 2. Chunk the content
        let chunks = self.chunker.split(&document.content);
        if chunks.is_empty() {
            warn!(document.id = %document.id, "no chunks generated for document");
            return Ok(0);
        }

        // 3. Generate embeddings
        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings =
            self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
                error!(document.id = %document.id, error = %e, "embedding failed during indexing");
            })?;

        // 4. Store
        let count = self
            .vector_store
            .upsert_chunks(&document.id, &chunks, &embeddings, &document.metadata)
            .await
            .inspect_err(|e| {
                error!(document.id = %document.id, error = %e, "upsert failed during indexing");
            })?;

        info!(document.id = %document.id, chunk_count = count, replaced, "indexed document");
        Ok(count)
    }

    /// Answer a question from the indexed chunks.
    ///
    /// Embeds the question, retrieves the `top_k` nearest chunks (restricted
    /// to `document_ids` when non-empty), and asks the generator to answer
    /// from them. When nothing matches, returns [`NO_RESULTS_ANSWER`] without
    /// calling the generator.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ValidationError`] before any remote call for a
    /// blank question or a `top_k` outside `1..=max_top_k`. Dependency
    /// failures are propagated unchanged.
    pub async fn query(
        &self,
        question: &str,
        document_ids: &[String],
        top_k: Option<usize>,
    ) -> Result<QueryResponse> {
        let top_k = top_k.unwrap_or(self.config.default_top_k);
        if question.trim().is_empty() {
            return Err(RagError::ValidationError("question must not be empty".to_string()));
        }
        if top_k == 0 || top_k > self.config.max_top_k {
            return Err(RagError::ValidationError(format!(
                "top_k must be between 1 and {}, got {top_k}",
                self.config.max_top_k
            )));
        }

        // 1. Embed the question
        let query_embedding = self.embedding_provider.embed(question).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        // 2. Search the vector store
        let matches =
            self.vector_store.search(&query_embedding, top_k, document_ids).await.inspect_err(
                |e| {
                    error!(top_k, filter = ?document_ids, error = %e, "vector store search failed");
                },
            )?;

        // 3. Nothing to ground an answer on
        if matches.is_empty() {
            info!(top_k, filter = ?document_ids, "query matched no chunks");
            return Ok(QueryResponse {
                answer: NO_RESULTS_ANSWER.to_string(),
                sources: Vec::new(),
                document_ids_searched: Vec::new(),
            });
        }

        // 4. Score and cite
        let (sources, document_ids_searched) = cite(&matches);

        // 5–6. Assemble the grounded prompt
        let context = assemble_context(&sources.iter().map(|s| &s.chunk_text).collect::<Vec<_>>());
        let prompt = build_prompt(&context, question);

        // 7. Generate
        info!(context_chunks = sources.len(), "sending prompt to generator");
        let answer = self.generator.generate(&prompt).await.inspect_err(|e| {
            error!(generator = self.generator.name(), error = %e, "generation failed");
        })?;

        Ok(QueryResponse { answer, sources, document_ids_searched })
    }

    /// Delete every chunk of a document and return how many were removed.
    ///
    /// Deleting an unknown document is not an error; it removes 0 chunks.
    pub async fn delete_document(&self, document_id: &str) -> Result<usize> {
        let _guard = self.locks.acquire(document_id).await;
        let count = self.vector_store.delete_document(document_id).await.inspect_err(|e| {
            error!(document_id, error = %e, "delete failed");
        })?;
        info!(document_id, chunk_count = count, "deleted document");
        Ok(count)
    }

    /// All indexed document ids, sorted.
    pub async fn list_documents(&self) -> Result<Vec<String>> {
        self.vector_store.list_document_ids().await
    }

    /// Probe the embedding service and the vector store.
    pub async fn health(&self) -> HealthReport {
        let (availability, store_ok) = tokio::join!(
            self.embedding_provider.check_availability(),
            self.vector_store.check_connection()
        );
        HealthReport::new(availability.reachable, store_ok, availability.models)
    }
}

/// Turn ranked matches into cited sources and the distinct document ids they
/// came from, both in ranked order.
fn cite(matches: &[IndexMatch]) -> (Vec<SourceChunk>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut document_ids = Vec::new();
    let sources = matches
        .iter()
        .map(|m| {
            let document_id = m.document_id().unwrap_or_default().to_string();
            if seen.insert(document_id.clone()) {
                document_ids.push(document_id.clone());
            }
            SourceChunk {
                document_id,
                chunk_text: m.text.clone(),
                relevance_score: relevance_score(m.distance),
                metadata: m.metadata.clone(),
            }
        })
        .collect();
    (sources, document_ids)
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `embedding_provider`, `vector_store` and `generator` are
/// required. The chunker defaults to a [`RecursiveChunker`] sized from the
/// config.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = RagPipeline::builder()
///     .config(RagConfig::default())
///     .embedding_provider(Arc::new(embedder))
///     .vector_store(Arc::new(store))
///     .generator(Arc::new(generator))
///     .build()?;
/// ```
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the answer generator.
    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Override the chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;
        let chunker = self.chunker.unwrap_or_else(|| {
            Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap))
        });

        Ok(RagPipeline {
            config,
            embedding_provider,
            vector_store,
            generator,
            chunker,
            locks: DocumentLocks::new(),
        })
    }
}
