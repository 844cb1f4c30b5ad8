use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::{get, post};
use axum::{Json, Router};
use docrag::ollama::{OllamaEmbeddingProvider, OllamaGenerator};
use docrag::{
    Document, HealthReport, InMemoryVectorStore, Metadata, QueryResponse, RagPipeline, VectorStore,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServiceConfig;
use crate::error::ApiError;

/// Whether the pipeline has been built yet.
#[derive(Clone, Default)]
pub enum Readiness {
    #[default]
    Starting,
    Ready(Arc<RagPipeline>),
}

/// Shared handler state.
#[derive(Clone, Default)]
pub struct AppState {
    readiness: Arc<RwLock<Readiness>>,
}

impl AppState {
    /// State whose services are still being built.
    pub fn starting() -> Self {
        Self::default()
    }

    /// State serving an already-built pipeline.
    pub fn ready(pipeline: Arc<RagPipeline>) -> Self {
        Self { readiness: Arc::new(RwLock::new(Readiness::Ready(pipeline))) }
    }

    /// Switch to serving `pipeline`.
    pub async fn mark_ready(&self, pipeline: Arc<RagPipeline>) {
        *self.readiness.write().await = Readiness::Ready(pipeline);
    }

    async fn pipeline(&self) -> Result<Arc<RagPipeline>, ApiError> {
        match &*self.readiness.read().await {
            Readiness::Ready(pipeline) => Ok(pipeline.clone()),
            Readiness::Starting => Err(ApiError::NotReady),
        }
    }
}

/// Body of `POST /api/rag/index`.
#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    pub document_id: String,
    pub content: String,
    pub filename: String,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

/// Reply to a successful index request.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexResponse {
    pub document_id: String,
    pub chunks_indexed: usize,
    pub message: String,
}

/// Body of `POST /api/rag/query`.
#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub document_ids: Option<Vec<String>>,
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// Body of `POST /api/rag/delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub document_id: String,
}

/// Reply to a delete request.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub document_id: String,
    pub chunks_deleted: usize,
    pub message: String,
}

/// The `/api/rag` routes with tracing and permissive CORS.
pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    let rag = Router::new()
        .route("/index", post(index_document))
        .route("/query", post(query))
        .route("/delete", post(delete_document))
        .route("/documents", get(list_documents))
        .route("/health", get(health));

    Router::new()
        .nest("/api/rag", rag)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Build the pipeline from `config`, then serve until Ctrl-C.
pub async fn run_server(config: ServiceConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid host/port '{}'", config.bind_address()))?;

    let state = AppState::starting();
    let pipeline = build_pipeline(&config).await?;
    state.mark_ready(Arc::new(pipeline)).await;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "docrag-server listening");

    axum::serve(listener, app_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    info!("docrag-server stopped");
    Ok(())
}

async fn build_pipeline(config: &ServiceConfig) -> anyhow::Result<RagPipeline> {
    let vector_store: Arc<dyn VectorStore> = match &config.vector_store_path {
        Some(path) => Arc::new(
            InMemoryVectorStore::open(path)
                .await
                .with_context(|| format!("failed to open vector store at {}", path.display()))?,
        ),
        None => Arc::new(InMemoryVectorStore::new()),
    };

    let pipeline = RagPipeline::builder()
        .config(config.rag.clone())
        .embedding_provider(Arc::new(OllamaEmbeddingProvider::new(
            &config.ollama_base_url,
            &config.embedding_model,
        )))
        .vector_store(vector_store)
        .generator(Arc::new(OllamaGenerator::new(&config.ollama_base_url, &config.llm_model)))
        .build()?;

    info!(
        ollama = %config.ollama_base_url,
        embedding_model = %config.embedding_model,
        llm_model = %config.llm_model,
        persist = ?config.vector_store_path,
        chunk_size = config.rag.chunk_size,
        chunk_overlap = config.rag.chunk_overlap,
        "RAG services initialized"
    );
    Ok(pipeline)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn index_document(
    State(state): State<AppState>,
    body: Result<Json<IndexRequest>, JsonRejection>,
) -> Result<Json<IndexResponse>, ApiError> {
    let Json(request) = body?;
    let pipeline = state.pipeline().await?;

    let mut metadata = Metadata::new();
    metadata.insert("filename".to_string(), request.filename.into());
    metadata.extend(request.metadata.unwrap_or_default());

    let document = Document { id: request.document_id, content: request.content, metadata };
    let chunks_indexed = pipeline.index_document(&document).await?;

    Ok(Json(IndexResponse {
        document_id: document.id,
        chunks_indexed,
        message: format!("Successfully indexed {chunks_indexed} chunks"),
    }))
}

async fn query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = body?;
    let pipeline = state.pipeline().await?;
    let document_ids = request.document_ids.unwrap_or_default();
    let response = pipeline.query(&request.question, &document_ids, request.top_k).await?;
    Ok(Json(response))
}

async fn delete_document(
    State(state): State<AppState>,
    body: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let Json(request) = body?;
    let pipeline = state.pipeline().await?;
    let chunks_deleted = pipeline.delete_document(&request.document_id).await?;

    let message = if chunks_deleted > 0 {
        format!("Deleted {chunks_deleted} chunks")
    } else {
        "No chunks found for this document".to_string()
    };
    Ok(Json(DeleteResponse { document_id: request.document_id, chunks_deleted, message }))
}

async fn list_documents(State(state): State<AppState>) -> Result<Json<Vec<String>>, ApiError> {
    let pipeline = state.pipeline().await?;
    Ok(Json(pipeline.list_documents().await?))
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    match state.pipeline().await {
        Ok(pipeline) => Json(pipeline.health().await),
        Err(_) => Json(HealthReport::unhealthy()),
    }
}
