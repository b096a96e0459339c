//! Error types for the ingest module

use crate::catalog::DbError;
use crate::crawler::storage::StorageError;
use crate::error::Error as CrateError;
use crate::extractor::ExtractError;
use thiserror::Error;

/// Error type for ingest operations
#[derive(Debug, Error)]
pub enum IngestError {
    /// Cached pages could not be read
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A cached page no longer matches the expected template
    #[error("Failed to parse {page}: {source}")]
    Parse {
        page: String,
        #[source]
        source: ExtractError,
    },

    /// The batch insert failed and was rolled back
    #[error("Database error: {0}")]
    Database(#[from] DbError),
}

impl From<IngestError> for CrateError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::Storage(e) => CrateError::Storage(e.to_string()),
            IngestError::Database(e) => e.into(),
            _ => CrateError::Ingest(err.to_string()),
        }
    }
}
