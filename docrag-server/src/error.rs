//! HTTP error responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use docrag::RagError;
use serde_json::json;
use tracing::warn;

/// An error returned by a handler, rendered as `{"detail": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("RAG services are not ready")]
    NotReady,

    #[error(transparent)]
    InvalidBody(#[from] JsonRejection),

    #[error(transparent)]
    Rag(#[from] RagError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::InvalidBody(rejection) => rejection.status(),
            ApiError::Rag(err) => match err {
                RagError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                RagError::EmbeddingUnavailable { .. }
                | RagError::GenerationUnavailable { .. }
                | RagError::VectorStoreError { .. } => StatusCode::SERVICE_UNAVAILABLE,
                RagError::EmbeddingError { .. } | RagError::GenerationError { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                RagError::DimensionMismatch { .. }
                | RagError::ConfigError(_)
                | RagError::PipelineError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::InvalidBody(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        warn!(status = status.as_u16(), %detail, "request failed");
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rag_errors_map_to_statuses() {
        let cases = [
            (RagError::ValidationError("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (
                RagError::EmbeddingUnavailable { provider: "p".into(), message: "m".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RagError::EmbeddingError { provider: "p".into(), message: "m".into() },
                StatusCode::BAD_GATEWAY,
            ),
            (
                RagError::VectorStoreError { backend: "b".into(), message: "m".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RagError::GenerationUnavailable { generator: "g".into(), message: "m".into() },
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                RagError::GenerationError { generator: "g".into(), message: "m".into() },
                StatusCode::BAD_GATEWAY,
            ),
            (RagError::DimensionMismatch { expected: 3, actual: 2 }, StatusCode::INTERNAL_SERVER_ERROR),
            (RagError::PipelineError("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn not_ready_is_unavailable() {
        assert_eq!(ApiError::NotReady.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
