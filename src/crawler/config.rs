//! # Crawler Configuration Module
//!
//! This module provides configuration options for the catalogue crawler:
//! which catalogue pages to visit, how many requests may be in flight at
//! once, and how long a single request may take. It uses a builder pattern
//! for flexible configuration.
//!
//! ## Key Components
//!
//! - `CrawlerConfig`: The main configuration struct with crawler parameters
//! - `CrawlerConfigBuilder`: Builder pattern implementation for easier configuration

use std::time::Duration;

/// Root of the public books catalogue
pub const DEFAULT_CATALOGUE_URL: &str = "http://books.toscrape.com/catalogue";

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Catalogue root; pages live at `{catalogue_url}/page-{N}.html`
    pub catalogue_url: String,

    /// First catalogue page to visit (inclusive)
    pub start_page: u32,

    /// Last catalogue page to visit (inclusive)
    pub end_page: u32,

    /// Maximum number of in-flight requests
    pub concurrency: usize,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent to use for requests
    pub user_agent: String,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            catalogue_url: DEFAULT_CATALOGUE_URL.to_string(),
            start_page: 1,
            end_page: 50,
            concurrency: 10,
            timeout_secs: 10,
            user_agent: format!("folio-crawler/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Builder for CrawlerConfig
#[derive(Debug, Default)]
pub struct CrawlerConfigBuilder {
    config: CrawlerConfig,
}

impl CrawlerConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: CrawlerConfig::default(),
        }
    }

    /// Set the catalogue root URL
    pub fn catalogue_url(mut self, catalogue_url: impl Into<String>) -> Self {
        self.config.catalogue_url = catalogue_url.into();
        self
    }

    /// Set the first catalogue page
    pub fn start_page(mut self, start_page: u32) -> Self {
        self.config.start_page = start_page;
        self
    }

    /// Set the last catalogue page
    pub fn end_page(mut self, end_page: u32) -> Self {
        self.config.end_page = end_page;
        self
    }

    /// Set the maximum number of in-flight requests (at least one)
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    /// Set the per-request timeout in seconds
    pub fn timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.config.timeout_secs = timeout_secs;
        self
    }

    /// Set the user agent to use for requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Build the configuration
    pub fn build(self) -> CrawlerConfig {
        self.config
    }
}

impl CrawlerConfig {
    /// Create a new builder
    pub fn builder() -> CrawlerConfigBuilder {
        CrawlerConfigBuilder::new()
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// URL of a numbered catalogue page
    pub fn catalogue_page_url(&self, page: u32) -> String {
        format!(
            "{}/page-{}.html",
            self.catalogue_url.trim_end_matches('/'),
            page
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.start_page, 1);
        assert_eq!(config.end_page, 50);
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_builder() {
        let config = CrawlerConfig::builder()
            .catalogue_url("http://site/catalogue/")
            .start_page(5)
            .end_page(20)
            .concurrency(0)
            .timeout_secs(3)
            .build();

        assert_eq!(config.start_page, 5);
        assert_eq!(config.end_page, 20);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.catalogue_page_url(7), "http://site/catalogue/page-7.html");
    }
}
