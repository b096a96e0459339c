//! Catalog store for scraped items
//!
//! This module owns the relational side of the pipeline: the `items` table
//! filled by the ingestor, and the one-to-one `derived_attributes` satellite
//! table written by the enrichment jobs. It also serves listing, detail and
//! analytics queries over the stored catalog.

/// Read one typed column from a libsql row, naming it in the error
macro_rules! get {
    ($row:expr, $idx:expr, $name:expr) => {
        $row.get($idx)
            .map_err(|e| DbError::Data(format!("Failed to get {}: {}", $name, e)))
    };
}

pub mod analytics;
mod database;
pub mod error;
mod schema;
pub mod vector;

pub use database::Database;
pub(crate) use database::{row_to_item, ITEM_COLUMNS};
pub use error::DbError;

#[cfg(test)]
pub(crate) use database::tests as test_support;

use serde::{Deserialize, Serialize};

/// Default page size for listings
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Largest page size a listing will return
pub const MAX_LIST_LIMIT: u32 = 100;

/// A stored catalog item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Internally assigned sequential id
    pub id: i64,

    /// Display name
    pub name: String,

    /// Price in the site currency
    pub price: Option<f64>,

    /// Rating from 1 to 5
    pub rating: Option<u8>,

    /// Free-text description
    pub description: Option<String>,

    /// Category label
    pub category: Option<String>,

    /// Site-assigned unique code used for deduplication
    pub external_code: Option<String>,

    /// Availability text as shown on the site
    pub availability: Option<String>,

    /// Units in stock
    pub stock_count: Option<u32>,
}

/// An item together with its derived attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,

    /// Generated marketing summary, if computed
    pub summary: Option<String>,

    /// Whether an embedding has been stored
    pub has_embedding: bool,
}

/// A derived attribute of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DerivedField {
    Embedding,
    Summary,
}

impl DerivedField {
    /// Column holding this attribute in `derived_attributes`
    pub fn column(&self) -> &'static str {
        match self {
            DerivedField::Embedding => "embedding",
            DerivedField::Summary => "summary",
        }
    }
}

/// An item lacking a derived attribute
///
/// `satellite_id` distinguishes "no satellite row yet" (`None`) from "row
/// exists but the field is null or empty" (`Some`). Both need enrichment;
/// the first is inserted, the second updated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingItem {
    pub item_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub satellite_id: Option<i64>,
}

/// A computed derived attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedValue {
    Embedding(Vec<f32>),
    Summary(String),
}

impl DerivedValue {
    /// Which field this value fills
    pub fn field(&self) -> DerivedField {
        match self {
            DerivedValue::Embedding(_) => DerivedField::Embedding,
            DerivedValue::Summary(_) => DerivedField::Summary,
        }
    }
}

/// A staged write of one derived attribute
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedWrite {
    pub item_id: i64,
    pub satellite_id: Option<i64>,
    pub value: DerivedValue,
}

impl DerivedWrite {
    /// Stage a value for a pending item
    pub fn for_item(item: &PendingItem, value: DerivedValue) -> Self {
        Self {
            item_id: item.item_id,
            satellite_id: item.satellite_id,
            value,
        }
    }
}

/// Row counts of a derived attribute batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteOutcome {
    /// New satellite rows
    pub inserted: usize,

    /// Existing satellite rows updated in place
    pub updated: usize,

    /// Inserts rejected because another run created the row first
    pub conflicts: usize,
}

/// Row counts of an item batch insert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InsertOutcome {
    /// New item rows
    pub inserted: usize,

    /// Records whose external code was already stored, or that had none
    pub skipped: usize,
}

/// Filters for `Database::list_items`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub offset: u32,
    pub limit: Option<u32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_rating: Option<u8>,
    /// Case-insensitive partial match on the category
    pub category: Option<String>,
    /// Case-insensitive partial match on name or description
    pub q: Option<String>,
}

impl ItemFilter {
    /// Page size after applying the default and the upper bound
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_limit() {
        assert_eq!(ItemFilter::default().effective_limit(), 20);

        let filter = ItemFilter {
            limit: Some(500),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), 100);

        let filter = ItemFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), 1);
    }

    #[test]
    fn test_derived_write_keeps_satellite_state() {
        let pending = PendingItem {
            item_id: 7,
            name: "Book".to_string(),
            description: None,
            category: None,
            satellite_id: Some(3),
        };
        let write = DerivedWrite::for_item(&pending, DerivedValue::Summary("s".to_string()));
        assert_eq!(write.item_id, 7);
        assert_eq!(write.satellite_id, Some(3));
        assert_eq!(write.value.field(), DerivedField::Summary);
    }

    #[test]
    fn test_item_detail_serializes_flat() {
        let detail = ItemDetail {
            item: Item {
                id: 1,
                name: "Book".to_string(),
                price: Some(10.5),
                rating: Some(3),
                description: None,
                category: Some("Poetry".to_string()),
                external_code: Some("abc".to_string()),
                availability: None,
                stock_count: Some(2),
            },
            summary: Some("Great".to_string()),
            has_embedding: false,
        };

        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "Book");
        assert_eq!(json["summary"], "Great");
        assert_eq!(json["stock_count"], 2);
    }
}
