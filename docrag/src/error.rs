//! Error types for the `docrag` crate.

use thiserror::Error;

/// Errors that can occur in RAG operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// The request was malformed (empty question, out-of-range `top_k`, ...).
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// The embedding service could not be reached.
    #[error("Embedding service unavailable ({provider}): {message}")]
    EmbeddingUnavailable {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The embedding service was reached but the call failed.
    #[error("Embedding error ({provider}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An embedding does not match the dimension established by the index.
    #[error("Dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension already established by the index.
        expected: usize,
        /// The dimension of the offending vector.
        actual: usize,
    },

    /// The language model could not be reached.
    #[error("Generation service unavailable ({generator}): {message}")]
    GenerationUnavailable {
        /// The generator that produced the error.
        generator: String,
        /// A description of the failure.
        message: String,
    },

    /// The language model was reached but generation failed.
    #[error("Generation error ({generator}): {message}")]
    GenerationError {
        /// The generator that produced the error.
        generator: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// An error in the RAG pipeline orchestration.
    #[error("Pipeline error: {0}")]
    PipelineError(String),
}

impl RagError {
    /// Whether this error means a remote dependency could not be reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            RagError::EmbeddingUnavailable { .. }
                | RagError::GenerationUnavailable { .. }
                | RagError::VectorStoreError { .. }
        )
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
