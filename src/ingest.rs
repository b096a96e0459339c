//! # Ingest Module
//!
//! Moves cached item pages into the catalog store. Every cached
//! `book_*.html` page is parsed with the extractor, and the resulting records
//! are inserted in one batch keyed by external code: a code already in the
//! store is skipped, never updated. Re-running the ingest over the same cache
//! inserts nothing.

mod error;

pub use error::IngestError;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::catalog::{Database, InsertOutcome};
use crate::crawler::storage::{CachedPage, Storage};
use crate::extractor::{parse_item, ItemRecord};

/// Outcome counts of an ingest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Cached item pages read
    pub pages_read: usize,

    /// Pages that produced a record
    pub records_parsed: usize,

    /// New items stored
    pub inserted: usize,

    /// Records skipped as duplicates or for lacking an external code
    pub skipped: usize,
}

/// Parse cached item pages into records
///
/// Empty pages yield no record. A page missing its title fails the whole
/// run, naming the offending page.
pub fn parse_pages(pages: &[CachedPage]) -> Result<Vec<ItemRecord>, IngestError> {
    let mut records = Vec::with_capacity(pages.len());
    for page in pages {
        match parse_item(&page.body) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => debug!("Skipping empty page {}", page.name),
            Err(source) => {
                return Err(IngestError::Parse {
                    page: page.name.clone(),
                    source,
                })
            }
        }
    }
    Ok(records)
}

/// Insert parsed records, skipping external codes already stored
pub async fn ingest(db: &Database, records: &[ItemRecord]) -> Result<InsertOutcome, IngestError> {
    Ok(db.insert_items(records).await?)
}

/// Read every cached item page, parse it, and store the new records
#[instrument(skip(storage, db), fields(cache = %storage.base_path().display()))]
pub async fn ingest_cached(storage: &Storage, db: &Database) -> Result<IngestReport, IngestError> {
    let pages = storage.load_item_pages().await?;
    info!("Ingesting {} cached item pages", pages.len());

    let records = parse_pages(&pages)?;
    let outcome = ingest(db, &records).await?;

    let report = IngestReport {
        pages_read: pages.len(),
        records_parsed: records.len(),
        inserted: outcome.inserted,
        skipped: outcome.skipped,
    };
    info!(
        "Ingest finished: {} inserted, {} skipped",
        report.inserted, report.skipped
    );
    Ok(report)
}
