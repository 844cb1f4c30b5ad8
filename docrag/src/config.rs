//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use crate::error::{RagError, Result};

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Number of overlapping characters between consecutive chunks.
    pub chunk_overlap: usize,
    /// Number of chunks retrieved when a query does not say.
    pub default_top_k: usize,
    /// Largest `top_k` a query may request.
    pub max_top_k: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            default_top_k: 3,
            max_top_k: 10,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in characters.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between consecutive chunks in characters.
    pub fn chunk_overlap(mut self, overlap: usize) -> Self {
        self.config.chunk_overlap = overlap;
        self
    }

    /// Set the number of chunks retrieved when a query does not say.
    pub fn default_top_k(mut self, k: usize) -> Self {
        self.config.default_top_k = k;
        self
    }

    /// Set the largest `top_k` a query may request.
    pub fn max_top_k(mut self, k: usize) -> Self {
        self.config.max_top_k = k;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if:
    /// - `chunk_size == 0`
    /// - `chunk_overlap == 0` or `chunk_overlap >= chunk_size`
    /// - `max_top_k == 0`
    /// - `default_top_k` is outside `1..=max_top_k`
    pub fn build(self) -> Result<RagConfig> {
        let config = self.config;
        if config.chunk_size == 0 {
            return Err(RagError::ConfigError("chunk_size must be greater than zero".to_string()));
        }
        if config.chunk_overlap == 0 {
            return Err(RagError::ConfigError(
                "chunk_overlap must be greater than zero".to_string(),
            ));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(RagError::ConfigError(format!(
                "chunk_overlap ({}) must be less than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }
        if config.max_top_k == 0 {
            return Err(RagError::ConfigError("max_top_k must be greater than zero".to_string()));
        }
        if config.default_top_k == 0 || config.default_top_k > config.max_top_k {
            return Err(RagError::ConfigError(format!(
                "default_top_k ({}) must be between 1 and max_top_k ({})",
                config.default_top_k, config.max_top_k
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_contract() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.chunk_overlap, 50);
        assert_eq!(config.default_top_k, 3);
        assert_eq!(config.max_top_k, 10);
    }

    #[test]
    fn overlap_must_be_smaller_than_chunk() {
        let err = RagConfig::builder().chunk_size(100).chunk_overlap(100).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn overlap_must_be_non_zero() {
        let err = RagConfig::builder().chunk_overlap(0).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
        assert!(RagConfig::builder().chunk_size(2).chunk_overlap(1).build().is_ok());
    }

    #[test]
    fn default_top_k_must_fit_bounds() {
        assert!(RagConfig::builder().default_top_k(0).build().is_err());
        assert!(RagConfig::builder().default_top_k(11).build().is_err());
        assert!(RagConfig::builder().max_top_k(0).build().is_err());
        assert!(RagConfig::builder().default_top_k(5).max_top_k(5).build().is_ok());
    }
}
