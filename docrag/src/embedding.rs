//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;

/// How often [`EmbeddingProvider::embed_batch`] reports progress.
const PROGRESS_INTERVAL: usize = 10;

/// Reachability of an embedding service and the models it serves.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Availability {
    /// Whether the service answered.
    pub reachable: bool,
    /// Model names reported by the service; empty when unreachable.
    pub models: Vec<String>,
}

impl Availability {
    /// The service answered and serves `models`.
    pub fn reachable(models: Vec<String>) -> Self {
        Self { reachable: true, models }
    }

    /// The service could not be reached.
    pub fn unreachable() -> Self {
        Self::default()
    }
}

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap a specific embedding backend behind a unified async
/// interface. Every vector produced by one provider has the same dimension;
/// the vector store rejects vectors of any other dimension.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::EmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new("http://localhost:11434", "nomic-embed-text");
/// let embedding = provider.embed("hello world").await?;
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// A short label used in logs and error messages.
    fn name(&self) -> &str;

    /// Generate an embedding vector for a single text input.
    ///
    /// Fails with [`RagError::EmbeddingUnavailable`](crate::RagError::EmbeddingUnavailable)
    /// when the service cannot be reached and with
    /// [`RagError::EmbeddingError`](crate::RagError::EmbeddingError) otherwise.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embedding vectors for a batch of text inputs.
    ///
    /// The result has the same length and order as `texts`. The first failing
    /// item aborts the batch; no partial results are returned. The default
    /// implementation calls [`embed`](EmbeddingProvider::embed) sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let total = texts.len();
        let mut results = Vec::with_capacity(total);
        for (i, text) in texts.iter().enumerate() {
            results.push(self.embed(text).await?);
            if (i + 1) % PROGRESS_INTERVAL == 0 {
                info!(provider = self.name(), done = i + 1, total, "embedding progress");
            }
        }
        info!(provider = self.name(), total, "generated embeddings");
        Ok(results)
    }

    /// Check whether the service is reachable and list its models.
    ///
    /// Never fails: any connectivity problem is reported as
    /// [`Availability::unreachable`].
    async fn check_availability(&self) -> Availability;
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::RagError;

    /// Returns the text length as a one-dimensional vector and records calls.
    struct LengthEmbedder {
        calls: Mutex<Vec<String>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        fn name(&self) -> &str {
            "length"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.calls.lock().unwrap().push(text.to_string());
            if self.fail_on == Some(text) {
                return Err(RagError::EmbeddingError {
                    provider: "length".into(),
                    message: "boom".into(),
                });
            }
            Ok(vec![text.len() as f32])
        }

        async fn check_availability(&self) -> Availability {
            Availability::reachable(vec!["length".into()])
        }
    }

    #[tokio::test]
    async fn batch_preserves_order() {
        let embedder = LengthEmbedder { calls: Mutex::new(Vec::new()), fail_on: None };
        let vectors = embedder.embed_batch(&["a", "bbb", "cc"]).await.unwrap();
        assert_eq!(vectors, vec![vec![1.0], vec![3.0], vec![2.0]]);
    }

    #[tokio::test]
    async fn batch_aborts_on_first_failure() {
        let embedder = LengthEmbedder { calls: Mutex::new(Vec::new()), fail_on: Some("bad") };
        let result = embedder.embed_batch(&["ok", "bad", "never"]).await;
        assert!(matches!(result, Err(RagError::EmbeddingError { .. })));
        assert_eq!(*embedder.calls.lock().unwrap(), vec!["ok".to_string(), "bad".to_string()]);
    }
}
