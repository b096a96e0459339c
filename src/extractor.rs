//! # HTML Extraction Module
//!
//! Pure parsing functions for the books catalogue. Nothing in here performs
//! I/O, so the crawler and the ingestor can both depend on it without
//! depending on each other.
//!
//! ## Key Components
//!
//! - `list_urls`: Collects item detail URLs from a catalogue page
//! - `parse_item`: Turns an item detail page into an `ItemRecord`
//! - `ExtractError`: Structural failures (the page template changed)
//!
//! Missing optional fields are encoded as `None`. Only the absence of the
//! product title is reported as an error, since every item page has one.

mod catalogue;
mod error;
mod item;

pub use catalogue::list_urls;
pub use error::ExtractError;
pub use item::parse_item;

use scraper::Selector;
use serde::{Deserialize, Serialize};

/// A structured record parsed from a single item page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    /// Display name (the product title)
    pub name: String,

    /// Price with the currency symbol stripped
    pub price: Option<f64>,

    /// Star rating between 1 and 5
    pub rating: Option<u8>,

    /// Free-text product description
    pub description: Option<String>,

    /// Category label from the breadcrumb
    pub category: Option<String>,

    /// Site-assigned unique code (UPC), used for deduplication
    pub external_code: Option<String>,

    /// Raw availability text, e.g. "In stock (22 available)"
    pub availability: Option<String>,

    /// Number of copies parsed from the availability text
    pub stock_count: Option<u32>,
}

/// Compile a CSS selector, mapping failures into an `ExtractError`
pub(crate) fn selector(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css)
        .map_err(|e| ExtractError::Selector(format!("Failed to parse selector '{}': {}", css, e)))
}
