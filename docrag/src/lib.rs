//! # docrag
//!
//! Retrieval pipeline for document question answering.
//!
//! A document is split into overlapping chunks, each chunk is embedded and
//! stored in a vector index, and a question is answered by retrieving the
//! nearest chunks and asking a language model to answer from them alone.
//!
//! - [`chunking`]: [`RecursiveChunker`]
//! - [`embedding`]: [`EmbeddingProvider`]
//! - [`vectorstore`] / [`inmemory`]: [`VectorStore`], [`InMemoryVectorStore`]
//! - [`generation`]: [`AnswerGenerator`] and the grounded prompt
//! - [`pipeline`]: [`RagPipeline`], the orchestrator
//! - `ollama` (feature `ollama`): Ollama-backed embedding and generation

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod inmemory;
pub mod locks;
#[cfg(feature = "ollama")]
pub mod ollama;
pub mod pipeline;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{
    Document, HealthReport, HealthStatus, IndexEntry, IndexMatch, Metadata, MetadataValue,
    QueryResponse, SourceChunk,
};
pub use embedding::{Availability, EmbeddingProvider};
pub use error::{RagError, Result};
pub use generation::AnswerGenerator;
pub use inmemory::InMemoryVectorStore;
pub use locks::DocumentLocks;
pub use pipeline::{NO_RESULTS_ANSWER, RagPipeline, RagPipelineBuilder, relevance_score};
pub use vectorstore::VectorStore;
