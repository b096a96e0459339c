//! # Catalogue Crawler Module
//!
//! This module fetches the book catalogue and fills the raw page cache. It is
//! the first stage of the pipeline: everything downstream (ingest,
//! enrichment, similarity) reads what the crawler cached.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: Page range, concurrency cap, timeout and user agent
//! - `fetch`: A single GET that logs failures instead of returning them
//! - `crawl_catalogue`: Catalogue discovery followed by item page fan-out
//! - `storage`: The raw page cache (`catalogue_page_{N}.html`, `book_{slug}.html`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use folio::crawler::{crawl_catalogue, storage::Storage, CrawlerConfig};
//!
//! # async fn run() -> Result<(), folio::crawler::CrawlError> {
//! let config = CrawlerConfig::builder().end_page(2).concurrency(4).build();
//! let report = crawl_catalogue(&config, &Storage::new()).await?;
//! println!("cached {} item pages", report.item_pages_fetched);
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod fetcher;
mod orchestrator;
pub mod storage;

// Re-export important types and functions
pub use config::{CrawlerConfig, CrawlerConfigBuilder, DEFAULT_CATALOGUE_URL};
pub use error::CrawlError;
pub use fetcher::{build_client, fetch, fetch_and_store};
pub use orchestrator::{crawl_catalogue, CrawlReport};
