//! # Folio - Book Catalog Pipeline for Rust
//!
//! This crate scrapes a public book catalogue, stores structured records in a
//! local libsql database, enriches them with vector embeddings and generated
//! marketing summaries, and answers nearest-neighbour and analytics queries
//! over the result.
//!
//! ## Features
//!
//! - Pipeline stages:
//!   - Concurrent, bounded catalogue crawling into a raw page cache
//!   - HTML extraction of item records
//!   - Idempotent ingest keyed by external code
//!   - Embedding and summary enrichment that only touches items missing them
//! - Similarity search using libsql's vector distance functions
//! - Filtered listings, item detail and catalog analytics
//! - Rate-limited model calls through `rig`
//! - Async API with Tokio
//! - Robust error handling and logging
//!
//! ## Example
//!
//! ```rust,no_run
//! use folio::catalog::Database;
//! use folio::crawler::{crawl_catalogue, storage::Storage, CrawlerConfig};
//! use folio::enrichment::{run_enrichment, EmbeddingEnricher};
//! use folio::ingest::ingest_cached;
//! use folio::model::Client;
//! use folio::search::{similar_items, DistanceMetric};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = Storage::new();
//!     let db = Database::new_from_path("catalog.db", 384).await?;
//!
//!     crawl_catalogue(&CrawlerConfig::default(), &storage).await?;
//!     ingest_cached(&storage, &db).await?;
//!
//!     let client = Client::new_gemini_from_env(384)?;
//!     run_enrichment(&db, &EmbeddingEnricher::new(&client, 384), None).await?;
//!
//!     for hit in similar_items(&db, 1, 5, DistanceMetric::Cosine).await? {
//!         println!("{:?} {}", hit.distance, hit.item.name);
//!     }
//!     Ok(())
//! }
//! ```

mod error;
pub mod model;

// Pipeline modules, leaf first
pub mod extractor;
pub mod crawler;
pub mod catalog;
pub mod ingest;
pub mod enrichment;
pub mod search;

pub use error::Error;

/// Re-export of types module for public use
pub mod prelude {
    pub use crate::error::Error;
    pub use crate::error::Result;
}
