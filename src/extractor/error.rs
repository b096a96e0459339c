//! Error types for the extractor module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for extraction operations
#[derive(Debug, Error)]
pub enum ExtractError {
    /// A required element is absent, which means the page template changed
    #[error("Required element missing: {0}")]
    MissingElement(String),

    /// CSS selector failed to compile
    #[error("Selector error: {0}")]
    Selector(String),

    /// Pattern failed to compile
    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<ExtractError> for CrateError {
    fn from(err: ExtractError) -> Self {
        CrateError::Extract(err.to_string())
    }
}
