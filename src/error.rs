//! Error types for the folio crate

use thiserror::Error;

/// Result type for folio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for folio operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTML extraction error
    #[error("Extract error: {0}")]
    Extract(String),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Raw page cache error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Ingestion error
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// Enrichment error
    #[error("Enrichment error: {0}")]
    Enrich(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Search error
    #[error("Search error: {0}")]
    Search(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
