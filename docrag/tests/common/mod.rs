//! Deterministic stand-ins for the remote services.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docrag::{AnswerGenerator, Availability, EmbeddingProvider, RagError, Result};

pub const DIMENSIONS: usize = 64;

/// Bag-of-words embedding: each lowercase word bumps one hashed coordinate.
/// Texts sharing words end up close in cosine distance.
pub fn bag_of_words(text: &str, dimensions: usize) -> Vec<f32> {
    let mut emb = vec![0.0f32; dimensions];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
        emb[(hash % dimensions as u64) as usize] += 1.0;
    }
    let norm: f32 = emb.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        emb.iter_mut().for_each(|x| *x /= norm);
    }
    emb
}

/// Embeds with [`bag_of_words`], optionally sleeping per call and failing on
/// texts containing a marker.
#[derive(Default)]
pub struct MockEmbeddingProvider {
    pub delay: Option<Duration>,
    pub fail_marker: Option<&'static str>,
    pub unreachable: bool,
    pub calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable {
            return Err(RagError::EmbeddingUnavailable {
                provider: "mock".into(),
                message: "connection refused".into(),
            });
        }
        if self.fail_marker.is_some_and(|marker| text.contains(marker)) {
            return Err(RagError::EmbeddingError {
                provider: "mock".into(),
                message: "rejected input".into(),
            });
        }
        Ok(bag_of_words(text, DIMENSIONS))
    }

    async fn check_availability(&self) -> Availability {
        if self.unreachable {
            Availability::unreachable()
        } else {
            Availability::reachable(vec!["mock-embed".into(), "mock-chat".into()])
        }
    }
}

/// Records every prompt and answers with a fixed string.
#[derive(Default)]
pub struct RecordingGenerator {
    pub prompts: Mutex<Vec<String>>,
    pub failure: Option<fn() -> RagError>,
}

impl RecordingGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(failure: fn() -> RagError) -> Self {
        Self { prompts: Mutex::new(Vec::new()), failure: Some(failure) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for RecordingGenerator {
    fn name(&self) -> &str {
        "recording"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.failure {
            Some(failure) => Err(failure()),
            None => Ok("generated answer".to_string()),
        }
    }
}
