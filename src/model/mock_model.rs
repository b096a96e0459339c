//! # Mock Models for Testing
//!
//! `MockCompletionModel` and `MockEmbeddingModel` implement the `rig` model
//! traits without any network access. Both count their calls so tests can
//! assert how many model requests a job made, and both can be switched into
//! a failing mode to exercise error paths.

use rig::{
    completion::{
        AssistantContent, CompletionError, CompletionModel, CompletionRequest, CompletionResponse,
    },
    embeddings::{Embedding, EmbeddingError, EmbeddingModel},
    one_or_many::OneOrMany,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A mock completion model returning a fixed text
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    response: Arc<Mutex<Option<String>>>,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl MockCompletionModel {
    /// Creates a mock model that answers with an empty text
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text the mock model should return
    pub async fn set_text_response(&self, text: &str) {
        let mut guard = self.response.lock().await;
        *guard = Some(text.to_string());
    }

    /// Make every following call fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of completion requests received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CompletionModel for MockCompletionModel {
    type Response = String;

    async fn completion(
        &self,
        _completion_request: CompletionRequest,
    ) -> Result<CompletionResponse<Self::Response>, CompletionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CompletionError::ProviderError(
                "mock completion failure".to_string(),
            ));
        }

        let text = {
            let guard = self.response.lock().await;
            guard.clone().unwrap_or_default()
        };
        Ok(CompletionResponse {
            choice: OneOrMany::one(AssistantContent::text(&text)),
            raw_response: text,
        })
    }
}

/// A mock embedding model with deterministic output
///
/// Each text maps to a vector derived from its bytes, so equal texts embed
/// equally and different texts (almost always) differ.
#[derive(Debug, Clone)]
pub struct MockEmbeddingModel {
    ndims: usize,
    calls: Arc<AtomicUsize>,
    fail: Arc<AtomicBool>,
}

impl MockEmbeddingModel {
    pub fn new(ndims: usize) -> Self {
        Self {
            ndims,
            calls: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every following call fail
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Number of `embed_texts` calls received
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The vector this model produces for a text
    pub fn vector_for(&self, text: &str) -> Vec<f64> {
        let seed = text
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        (0..self.ndims)
            .map(|i| ((seed.wrapping_add(i as u64 * 7919) % 1000) as f64) / 1000.0)
            .collect()
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    const MAX_DOCUMENTS: usize = 100;

    fn ndims(&self) -> usize {
        self.ndims
    }

    async fn embed_texts(
        &self,
        texts: impl IntoIterator<Item = String> + Send,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(EmbeddingError::ProviderError(
                "mock embedding failure".to_string(),
            ));
        }

        Ok(texts
            .into_iter()
            .map(|text| Embedding {
                vec: self.vector_for(&text),
                document: text,
            })
            .collect())
    }
}
