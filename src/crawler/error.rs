//! Error types for the crawler module

use crate::crawler::storage::StorageError;
use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
///
/// Individual fetch failures never surface here; they are logged and the
/// page is treated as empty. These variants cover setup failures only.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Raw page cache error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        match err {
            CrawlError::Http(e) => CrateError::Http(e),
            CrawlError::Storage(e) => CrateError::Storage(e.to_string()),
            _ => CrateError::Crawl(err.to_string()),
        }
    }
}
