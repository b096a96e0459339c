//! Error types for the enrichment module

use crate::catalog::DbError;
use crate::error::Error as CrateError;
use rig::completion::CompletionError;
use rig::embeddings::EmbeddingError;
use thiserror::Error;

/// Error type for enrichment operations
///
/// Any of these aborts the run before its batch is written.
#[derive(Debug, Error)]
pub enum EnrichError {
    /// Embedding model call failed
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Completion model call failed
    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    /// The model returned no usable output
    #[error("Empty model output for item {0}")]
    EmptyOutput(i64),

    /// The embedding length differs from the store's dimensionality
    #[error("Embedding for item {item_id} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        item_id: i64,
        expected: usize,
        actual: usize,
    },

    /// Store read or write failed
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<EnrichError> for CrateError {
    fn from(err: EnrichError) -> Self {
        match err {
            EnrichError::Database(e) => e.into(),
            _ => CrateError::Enrich(err.to_string()),
        }
    }
}
