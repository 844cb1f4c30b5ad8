//! Ollama embedding provider and answer generator.
//!
//! This module is only available when the `ollama` feature is enabled. Both
//! clients talk to the Ollama REST API directly with `reqwest`:
//!
//! - embeddings: `POST /api/embeddings` with `{model, prompt}`
//! - model listing: `GET /api/tags`
//! - generation: `POST /api/chat` with a single user message, non-streaming
//!
//! Neither client sets a request timeout or retries; callers apply their own
//! deadlines.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::{Availability, EmbeddingProvider};
use crate::error::{RagError, Result};
use crate::generation::AnswerGenerator;

/// The default Ollama endpoint.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// The default embedding model (768-dimensional vectors).
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// The default chat model.
pub const DEFAULT_LLM_MODEL: &str = "llama3.2:1b";

const PROVIDER: &str = "Ollama";

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Connection refused, DNS failure or timeout: the service is not there.
fn is_unreachable(e: &reqwest::Error) -> bool {
    e.is_connect() || e.is_timeout()
}

/// Read an error body, preferring Ollama's `{"error": "..."}` message.
async fn error_detail(response: reqwest::Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error).unwrap_or(body);
    format!("API returned {status}: {detail}")
}

// ── Ollama API request/response types ──────────────────────────────

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Deserialize)]
struct ModelTag {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

// ── Embedding provider ─────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by an Ollama server.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::ollama::OllamaEmbeddingProvider;
///
/// let provider = OllamaEmbeddingProvider::new("http://localhost:11434", "nomic-embed-text");
/// let embedding = provider.embed("hello world").await?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaEmbeddingProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbeddingProvider {
    /// Create a provider for `model` served at `base_url`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), model: model.into() }
    }

    /// Share an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The embedding model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_error(&self, e: reqwest::Error) -> RagError {
        error!(provider = PROVIDER, model = %self.model, error = %e, "embedding request failed");
        if is_unreachable(&e) {
            RagError::EmbeddingUnavailable {
                provider: PROVIDER.into(),
                message: format!("cannot reach {}: {e}", self.base_url),
            }
        } else {
            RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: format!("request failed: {e}"),
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbeddingProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding text");

        let response = self
            .client
            .post(endpoint(&self.base_url, "/api/embeddings"))
            .json(&EmbeddingRequest { model: &self.model, prompt: text })
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, model = %self.model, %message, "embedding API error");
            return Err(RagError::EmbeddingError { provider: PROVIDER.into(), message });
        }

        let body: EmbeddingResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse embedding response");
            RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        if body.embedding.is_empty() {
            return Err(RagError::EmbeddingError {
                provider: PROVIDER.into(),
                message: format!("model '{}' returned an empty embedding", self.model),
            });
        }
        Ok(body.embedding)
    }

    async fn check_availability(&self) -> Availability {
        let response = match self.client.get(endpoint(&self.base_url, "/api/tags")).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                error!(provider = PROVIDER, status = %response.status(), "model listing failed");
                return Availability::unreachable();
            }
            Err(e) => {
                error!(provider = PROVIDER, error = %e, "failed to connect to Ollama");
                return Availability::unreachable();
            }
        };

        match response.json::<TagsResponse>().await {
            Ok(tags) => Availability::reachable(
                tags.models.into_iter().filter_map(|tag| tag.model.or(tag.name)).collect(),
            ),
            Err(e) => {
                error!(provider = PROVIDER, error = %e, "failed to parse model listing");
                Availability::unreachable()
            }
        }
    }
}

// ── Answer generator ───────────────────────────────────────────────

/// An [`AnswerGenerator`] backed by Ollama's chat endpoint.
///
/// # Example
///
/// ```rust,ignore
/// use docrag::ollama::OllamaGenerator;
///
/// let generator = OllamaGenerator::new("http://localhost:11434", "llama3.2:1b");
/// let answer = generator.generate(&prompt).await?;
/// ```
#[derive(Debug, Clone)]
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    /// Create a generator for `model` served at `base_url`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), base_url: base_url.into(), model: model.into() }
    }

    /// Share an existing HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The chat model name.
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl AnswerGenerator for OllamaGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = PROVIDER, model = %self.model, prompt_len = prompt.len(), "generating");

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content: prompt }],
            stream: false,
        };

        let response = self
            .client
            .post(endpoint(&self.base_url, "/api/chat"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = PROVIDER, model = %self.model, error = %e, "chat request failed");
                if is_unreachable(&e) {
                    RagError::GenerationUnavailable {
                        generator: PROVIDER.into(),
                        message: format!("cannot reach {}: {e}", self.base_url),
                    }
                } else {
                    RagError::GenerationError {
                        generator: PROVIDER.into(),
                        message: format!("request failed: {e}"),
                    }
                }
            })?;

        if !response.status().is_success() {
            let message = error_detail(response).await;
            error!(provider = PROVIDER, model = %self.model, %message, "chat API error");
            return Err(RagError::GenerationError { generator: PROVIDER.into(), message });
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse chat response");
            RagError::GenerationError {
                generator: PROVIDER.into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(body.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        assert_eq!(endpoint("http://h:1/", "/api/tags"), "http://h:1/api/tags");
        assert_eq!(endpoint("http://h:1", "/api/tags"), "http://h:1/api/tags");
    }

    #[test]
    fn chat_request_is_non_streaming_user_message() {
        let request = ChatRequest {
            model: "m",
            messages: vec![ChatMessage { role: "user", content: "hi" }],
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "model": "m",
                "messages": [{"role": "user", "content": "hi"}],
                "stream": false
            })
        );
    }

    #[test]
    fn tags_prefer_model_field() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models": [{"name": "a", "model": "a:latest"}, {"name": "b"}]}"#,
        )
        .unwrap();
        let names: Vec<String> =
            tags.models.into_iter().filter_map(|t| t.model.or(t.name)).collect();
        assert_eq!(names, vec!["a:latest".to_string(), "b".to_string()]);
    }
}
