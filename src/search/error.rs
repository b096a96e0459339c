use thiserror::Error;

use crate::catalog::DbError;
use crate::error::Error as CrateError;

/// Errors that can occur during similarity search
#[derive(Debug, Error)]
pub enum SearchError {
    /// Error occurred during database operations
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    /// Error occurred while reading a ranked row
    #[error("Result processing error: {0}")]
    ResultProcessing(String),
}

impl From<SearchError> for CrateError {
    fn from(err: SearchError) -> Self {
        CrateError::Search(err.to_string())
    }
}
