//! Two-phase catalogue crawl
//!
//! Phase one fetches every catalogue page in the configured range and
//! collects item URLs. Phase two starts only after phase one has finished and
//! fetches every discovered item page. Within a phase, fetches run
//! concurrently behind one semaphore; failed fetches are skipped, never
//! retried.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::fetcher::{build_client, fetch_and_store};
use crate::crawler::storage::{catalogue_filename, item_filename, Storage};
use crate::extractor::list_urls;

/// Outcome counts of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    /// Catalogue pages that returned a body
    pub catalogue_pages_fetched: usize,

    /// Distinct item URLs found across all catalogue pages
    pub item_urls_discovered: usize,

    /// Item pages that returned a body and were cached
    pub item_pages_fetched: usize,
}

/// Crawl the catalogue and cache every reachable item page
///
/// # Arguments
///
/// * `config` - Page range, concurrency cap, and request settings
/// * `storage` - Raw page cache receiving every fetched body
///
/// # Returns
///
/// Counts of fetched pages. Individual fetch failures only lower the counts.
#[instrument(skip(storage), fields(start = config.start_page, end = config.end_page))]
pub async fn crawl_catalogue(
    config: &CrawlerConfig,
    storage: &Storage,
) -> Result<CrawlReport, CrawlError> {
    info!(
        "Crawling catalogue pages {}..={} with concurrency {}",
        config.start_page, config.end_page, config.concurrency
    );

    let client = build_client(config)?;
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));

    // Phase one: catalogue discovery
    let tasks = (config.start_page..=config.end_page)
        .map(|page| {
            let permit = semaphore.clone().acquire_owned();
            let client = client.clone();
            let storage = storage.clone();
            let url = config.catalogue_page_url(page);
            let catalogue_url = config.catalogue_url.clone();

            tokio::spawn(async move {
                let _permit = permit
                    .await
                    .map_err(|e| CrawlError::Other(format!("Semaphore closed: {}", e)))?;
                Ok::<_, CrawlError>(
                    discover_page(&client, &storage, page, &url, &catalogue_url).await,
                )
            })
        })
        .collect::<Vec<_>>();

    let mut report = CrawlReport::default();
    let mut seen = HashSet::new();
    let mut item_urls = Vec::new();

    for result in future::join_all(tasks).await {
        match result {
            Ok(Ok(Some(urls))) => {
                report.catalogue_pages_fetched += 1;
                for url in urls {
                    if seen.insert(url.clone()) {
                        item_urls.push(url);
                    }
                }
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(CrawlError::Other(format!("Task failed: {}", e))),
        }
    }
    report.item_urls_discovered = item_urls.len();
    info!(
        "Discovered {} item URLs on {} catalogue pages",
        report.item_urls_discovered, report.catalogue_pages_fetched
    );

    // Phase two: item pages
    let tasks = item_urls
        .into_iter()
        .filter_map(|url| {
            let name = match item_filename(&url) {
                Ok(name) => name,
                Err(e) => {
                    error!("No cache name for {}: {}", url, e);
                    return None;
                }
            };
            let permit = semaphore.clone().acquire_owned();
            let client = client.clone();
            let storage = storage.clone();

            Some(tokio::spawn(async move {
                let _permit = permit
                    .await
                    .map_err(|e| CrawlError::Other(format!("Semaphore closed: {}", e)))?;
                Ok::<bool, CrawlError>(
                    fetch_and_store(&client, &storage, &url, &name)
                        .await
                        .is_some(),
                )
            }))
        })
        .collect::<Vec<_>>();

    for result in future::join_all(tasks).await {
        match result {
            Ok(Ok(true)) => report.item_pages_fetched += 1,
            Ok(Ok(false)) => {}
            Ok(Err(e)) => return Err(e),
            Err(e) => return Err(CrawlError::Other(format!("Task failed: {}", e))),
        }
    }

    info!(
        "Crawl finished: {} of {} item pages fetched",
        report.item_pages_fetched, report.item_urls_discovered
    );
    Ok(report)
}

/// Fetch one catalogue page and list its item URLs
///
/// `None` means the page could not be fetched.
async fn discover_page(
    client: &reqwest::Client,
    storage: &Storage,
    page: u32,
    url: &str,
    catalogue_url: &str,
) -> Option<Vec<String>> {
    let body = fetch_and_store(client, storage, url, &catalogue_filename(page)).await?;
    match list_urls(&body, catalogue_url) {
        Ok(urls) => {
            debug!("Catalogue page {} lists {} items", page, urls.len());
            Some(urls)
        }
        Err(e) => {
            warn!("Skipping catalogue page {}: {}", page, e);
            Some(Vec::new())
        }
    }
}
