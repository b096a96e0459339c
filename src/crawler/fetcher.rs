//! Page fetching with per-request failure isolation

use reqwest::Client as HttpClient;
use tracing::{debug, error, instrument, warn};

use crate::crawler::config::CrawlerConfig;
use crate::crawler::error::CrawlError;
use crate::crawler::storage::Storage;

/// Build the HTTP client shared by all fetches of a crawl
pub fn build_client(config: &CrawlerConfig) -> Result<HttpClient, CrawlError> {
    let client = HttpClient::builder()
        .timeout(config.timeout())
        .user_agent(config.user_agent.clone())
        .build()?;
    Ok(client)
}

/// GET a page body
///
/// Returns `None` on a transport error or a non-success status. Failures are
/// logged and never returned to the caller, so one bad URL cannot abort a
/// batch of fetches.
#[instrument(skip(client))]
pub async fn fetch(client: &HttpClient, url: &str) -> Option<String> {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            error!("Error fetching {}: {}", url, e);
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        warn!("Failed to fetch {}: status {}", url, status);
        return None;
    }

    match response.text().await {
        Ok(body) => {
            debug!("Fetched {} ({} bytes)", url, body.len());
            Some(body)
        }
        Err(e) => {
            error!("Error reading body of {}: {}", url, e);
            None
        }
    }
}

/// GET a page body and write it to the raw page cache under `name`
///
/// A cache write failure is logged; the body is still returned.
pub async fn fetch_and_store(
    client: &HttpClient,
    storage: &Storage,
    url: &str,
    name: &str,
) -> Option<String> {
    let body = fetch(client, url).await?;
    if let Err(e) = storage.store(name, &body).await {
        error!("Failed to cache {} as {}: {}", url, name, e);
    }
    Some(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::storage::StorageConfig;
    use tempfile::tempdir;

    fn test_client() -> HttpClient {
        build_client(&CrawlerConfig::builder().timeout_secs(5).build()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/page-1.html")
            .with_status(200)
            .with_body("<html>ok</html>")
            .create_async()
            .await;

        let url = format!("{}/page-1.html", server.url());
        let body = fetch(&test_client(), &url).await;

        mock.assert_async().await;
        assert_eq!(body.as_deref(), Some("<html>ok</html>"));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/missing.html")
            .with_status(404)
            .with_body("not found")
            .create_async()
            .await;

        let url = format!("{}/missing.html", server.url());
        assert!(fetch(&test_client(), &url).await.is_none());
    }

    #[tokio::test]
    async fn test_fetch_transport_error_is_empty() {
        // Nothing listens on port 9 of the loopback interface
        assert!(fetch(&test_client(), "http://127.0.0.1:9/page.html")
            .await
            .is_none());
    }

    #[tokio::test]
    async fn test_fetch_and_store_writes_cache() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/book_1/index.html")
            .with_status(200)
            .with_body("<html>book</html>")
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let storage = Storage::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });

        let url = format!("{}/book_1/index.html", server.url());
        let body = fetch_and_store(&test_client(), &storage, &url, "book_book_1.html").await;

        assert_eq!(body.as_deref(), Some("<html>book</html>"));
        assert_eq!(
            storage.load("book_book_1.html").await.unwrap(),
            "<html>book</html>"
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_writes_nothing() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.html")
            .with_status(500)
            .create_async()
            .await;

        let dir = tempdir().unwrap();
        let storage = Storage::with_config(StorageConfig {
            base_path: dir.path().to_path_buf(),
        });

        let url = format!("{}/gone.html", server.url());
        assert!(fetch_and_store(&test_client(), &storage, &url, "book_gone.html")
            .await
            .is_none());
        assert!(storage.load("book_gone.html").await.is_err());
    }
}
