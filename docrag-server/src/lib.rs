//! `docrag-server` exposes the docrag pipeline over HTTP under `/api/rag`.
//! Ollama provides embeddings and generation; the vector index is kept in
//! memory and optionally persisted to disk.

pub mod config;
pub mod error;
pub mod server;
pub mod telemetry;

pub use config::{ConfigError, LogFormat, ServiceConfig};
pub use error::ApiError;
pub use server::{AppState, Readiness, app_router, run_server};
