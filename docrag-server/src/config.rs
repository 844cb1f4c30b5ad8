//! Service configuration read from the environment.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `HOST` | `0.0.0.0` |
//! | `PORT` | `5002` |
//! | `OLLAMA_BASE_URL` | `http://localhost:11434` |
//! | `EMBEDDING_MODEL` | `nomic-embed-text` |
//! | `LLM_MODEL` | `llama3.2:1b` |
//! | `VECTOR_STORE_PATH` | `./vector_data` (empty keeps the index in memory) |
//! | `CHUNK_SIZE` | `500` |
//! | `CHUNK_OVERLAP` | `50` |
//! | `LOG_LEVEL` | `info` |
//! | `LOG_FORMAT` | `text` (`json` for structured output) |

use std::path::PathBuf;
use std::str::FromStr;

use docrag::chunking::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use docrag::ollama::{DEFAULT_BASE_URL, DEFAULT_EMBEDDING_MODEL, DEFAULT_LLM_MODEL};
use docrag::{RagConfig, RagError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5002;
const DEFAULT_VECTOR_STORE_PATH: &str = "./vector_data";
const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while reading the service configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue { key: &'static str, value: String, reason: String },

    #[error(transparent)]
    Pipeline(#[from] RagError),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Everything the service needs to start.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: String,
    pub port: u16,
    pub ollama_base_url: String,
    pub embedding_model: String,
    pub llm_model: String,
    /// `None` keeps the index in memory only.
    pub vector_store_path: Option<PathBuf>,
    pub rag: RagConfig,
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            ollama_base_url: DEFAULT_BASE_URL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            vector_store_path: Some(PathBuf::from(DEFAULT_VECTOR_STORE_PATH)),
            rag: RagConfig::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::Text,
        }
    }
}

impl ServiceConfig {
    /// Load a `.env` file if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let string = |key: &str, default: String| lookup(key).unwrap_or(default);

        let chunk_size = parse(&lookup, "CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = parse(&lookup, "CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;
        let rag = RagConfig::builder().chunk_size(chunk_size).chunk_overlap(chunk_overlap).build()?;

        let vector_store_path = match lookup("VECTOR_STORE_PATH") {
            Some(path) if path.trim().is_empty() => None,
            Some(path) => Some(PathBuf::from(path)),
            None => defaults.vector_store_path,
        };

        let log_format = match lookup("LOG_FORMAT").as_deref().map(str::trim) {
            Some(format) if format.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };

        Ok(Self {
            host: string("HOST", defaults.host),
            port: parse(&lookup, "PORT", defaults.port)?,
            ollama_base_url: string("OLLAMA_BASE_URL", defaults.ollama_base_url),
            embedding_model: string("EMBEDDING_MODEL", defaults.embedding_model),
            llm_model: string("LLM_MODEL", defaults.llm_model),
            vector_store_path,
            rag,
            log_level: string("LOG_LEVEL", defaults.log_level),
            log_format,
        })
    }

    /// `host:port` for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidValue {
            key,
            reason: e.to_string(),
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ServiceConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:5002");
        assert_eq!(config.ollama_base_url, "http://localhost:11434");
        assert_eq!(config.embedding_model, "nomic-embed-text");
        assert_eq!(config.llm_model, "llama3.2:1b");
        assert_eq!(config.vector_store_path, Some(PathBuf::from("./vector_data")));
        assert_eq!(config.rag.chunk_size, 500);
        assert_eq!(config.rag.chunk_overlap, 50);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn overrides_are_read() {
        let config = ServiceConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("CHUNK_SIZE", "200"),
            ("CHUNK_OVERLAP", " 20 "),
            ("VECTOR_STORE_PATH", ""),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rag.chunk_size, 200);
        assert_eq!(config.rag.chunk_overlap, 20);
        assert!(config.vector_store_path.is_none());
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = ServiceConfig::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = ServiceConfig::from_lookup(lookup(&[("CHUNK_SIZE", "50"), ("CHUNK_OVERLAP", "50")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Pipeline(RagError::ConfigError(_))));
    }

    #[test]
    fn zero_overlap_is_rejected() {
        let err = ServiceConfig::from_lookup(lookup(&[("CHUNK_OVERLAP", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Pipeline(RagError::ConfigError(_))));
    }
}
