//! # Model Client Module
//!
//! This module bundles the two external model calls used by enrichment, a
//! completion model for summaries and an embedding model for vectors, behind
//! one `Client`. The Gemini constructors wrap both in rate limiters so a
//! large enrichment batch cannot exhaust the API quota.
//!
//! ## Key Components
//!
//! - `Client`: A unified client that wraps both completion and embedding models
//! - `RateLimitedCompletionModel`: A wrapper that adds rate limiting to any completion model
//! - `RateLimitedEmbeddingModel`: A wrapper that adds rate limiting to any embedding model
//!
//! Any `rig` model pair can be injected with `Client::with_models`, which is
//! how tests substitute the mocks in `mock_model`.

use std::num::NonZeroU32;

use governor::{Quota, RateLimiter};
use ratelimited_completion::RateLimitedCompletionModel;
use ratelimited_embedding::RateLimitedEmbeddingModel;
use rig::{completion::CompletionModel, embeddings::EmbeddingModel, providers::gemini};

use crate::error::{Error, Result};

#[cfg(test)]
pub mod mock_model;
pub mod ratelimited_completion;
pub mod ratelimited_embedding;

/// Gemini model used for summaries on the paid tier
const COMPLETION_MODEL: &str = "gemini-2.0-flash";

/// Gemini model used for summaries on the free tier
const FREE_COMPLETION_MODEL: &str = "gemini-2.0-flash-lite";

#[derive(Debug, Clone)]
pub struct Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    completion_model: C,
    embedding_model: E,
}

pub struct RateLimitResponse<T> {
    #[allow(dead_code)]
    response: T,
}

/// Requests per minute for one model
fn quota(per_minute: u32) -> Result<Quota> {
    NonZeroU32::new(per_minute)
        .map(Quota::per_minute)
        .ok_or_else(|| Error::Config("rate limit must be positive".to_string()))
}

fn api_key(var: &str) -> Result<String> {
    std::env::var(var)
        .map_err(|_| Error::Config(format!("{} environment variable must be set", var)))
}

pub type GeminiClient = Client<
    RateLimitedCompletionModel<gemini::completion::CompletionModel>,
    RateLimitedEmbeddingModel<gemini::embedding::EmbeddingModel>,
>;

impl GeminiClient {
    /// Paid-tier client from `GEMINI_API_KEY`
    pub fn new_gemini_from_env(dimensions: usize) -> Result<Self> {
        let gemini_client = gemini::Client::new(&api_key("GEMINI_API_KEY")?);
        Self::new_gemini(gemini_client, dimensions)
    }

    /// Free-tier client from `GEMINI_FREE_API_KEY`
    pub fn new_gemini_free_from_env(dimensions: usize) -> Result<Self> {
        let gemini_client = gemini::Client::new(&api_key("GEMINI_FREE_API_KEY")?);
        Self::new_gemini_free(gemini_client, dimensions)
    }

    pub fn new_gemini(gemini_client: gemini::Client, dimensions: usize) -> Result<Self> {
        Self::gemini_with_limits(gemini_client, COMPLETION_MODEL, 2000, 1000, dimensions)
    }

    pub fn new_gemini_free(gemini_client: gemini::Client, dimensions: usize) -> Result<Self> {
        Self::gemini_with_limits(gemini_client, FREE_COMPLETION_MODEL, 30, 1000, dimensions)
    }

    fn gemini_with_limits(
        gemini_client: gemini::Client,
        completion_model: &str,
        completion_per_minute: u32,
        embedding_per_minute: u32,
        dimensions: usize,
    ) -> Result<Self> {
        let completion_model = RateLimitedCompletionModel::new(
            gemini_client.completion_model(completion_model),
            RateLimiter::direct(quota(completion_per_minute)?),
        );
        let embedding_model = RateLimitedEmbeddingModel::new(
            gemini_client
                .embedding_model_with_ndims(gemini::embedding::EMBEDDING_004, dimensions),
            RateLimiter::direct(quota(embedding_per_minute)?),
        );
        Ok(Self {
            completion_model,
            embedding_model,
        })
    }
}

impl<C, E> Client<C, E>
where
    C: CompletionModel,
    E: EmbeddingModel,
{
    /// Wrap an arbitrary model pair
    pub fn with_models(completion_model: C, embedding_model: E) -> Self {
        Self {
            completion_model,
            embedding_model,
        }
    }

    pub fn completion(&self) -> &C {
        &self.completion_model
    }

    pub fn embedding(&self) -> &E {
        &self.embedding_model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_rejects_zero() {
        assert!(quota(0).is_err());
        assert!(quota(30).is_ok());
    }

    #[test]
    fn test_missing_api_key_is_config_error() {
        let result = api_key("FOLIO_TEST_KEY_THAT_IS_NEVER_SET");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
