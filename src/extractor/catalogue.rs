//! Catalogue page extraction

use scraper::Html;
use tracing::debug;

use super::{selector, ExtractError};

/// Anchors inside item cards on a catalogue page
const ITEM_LINK_SELECTOR: &str = "article.product_pod h3 a";

/// Collect the absolute URLs of all item pages linked from a catalogue page
///
/// # Arguments
///
/// * `html` - Body of the catalogue page
/// * `base_url` - Catalogue root that relative links are resolved against
///
/// # Returns
///
/// Item URLs in document order. Anchors without an `href` are skipped.
pub fn list_urls(html: &str, base_url: &str) -> Result<Vec<String>, ExtractError> {
    if html.trim().is_empty() {
        return Ok(Vec::new());
    }

    let document = Html::parse_document(html);
    let link_selector = selector(ITEM_LINK_SELECTOR)?;
    let base = base_url.trim_end_matches('/');

    let urls = document
        .select(&link_selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(|href| {
            // Links are relative to the page, e.g. "../../../some-book_12/index.html"
            let relative = href.replace("../", "");
            let url = format!("{}/{}", base, relative.trim_start_matches('/'));
            debug!("Found item URL {} for {}", url, href);
            url
        })
        .collect();

    Ok(urls)
}
