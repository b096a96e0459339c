//! # Enrichment Module
//!
//! Fills the derived attributes of stored items: an embedding vector for
//! similarity search and a short generated marketing summary. Both jobs share
//! one shape, captured by the `Enricher` trait and driven by
//! `run_enrichment`:
//!
//! 1. Select the items whose target attribute is missing (no satellite row,
//!    or a null/empty value in it)
//! 2. Compute the attribute for each through the model client
//! 3. Write every value in one transaction, updating existing satellite rows
//!    in place and inserting the rest
//!
//! Items that already carry a value are never recomputed, so a second run
//! with no new items makes no model calls at all. A model failure aborts the
//! run before anything is written.

pub mod config;
mod embedding;
mod error;
mod summary;

pub use config::{EnrichmentConfig, EnrichmentConfigBuilder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use embedding::{embedding_text, EmbeddingEnricher};
pub use error::EnrichError;
pub use summary::{summary_prompt, SummaryEnricher};

use std::future::Future;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::catalog::{Database, DerivedField, DerivedValue, DerivedWrite, PendingItem};

/// One derived attribute and how to compute it
pub trait Enricher {
    /// The attribute this job fills
    const FIELD: DerivedField;

    /// Compute the attribute for one item
    fn compute(
        &self,
        item: &PendingItem,
    ) -> impl Future<Output = Result<DerivedValue, EnrichError>> + Send;
}

/// Outcome counts of an enrichment run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EnrichmentReport {
    /// Items found missing the attribute
    pub pending: usize,

    /// New satellite rows
    pub inserted: usize,

    /// Satellite rows updated in place
    pub updated: usize,

    /// Inserts lost to a concurrent run
    pub conflicts: usize,

    /// Items left for a later run because the model returned nothing
    pub skipped: usize,
}

impl EnrichmentReport {
    /// Items whose attribute was written
    pub fn written(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Run one enrichment job over every item missing its attribute
///
/// # Arguments
///
/// * `db` - Catalog store
/// * `job` - The attribute computation
/// * `progress` - Optional channel receiving each processed item id
#[instrument(skip(db, job, progress), fields(field = J::FIELD.column()))]
pub async fn run_enrichment<J>(
    db: &Database,
    job: &J,
    progress: Option<mpsc::Sender<i64>>,
) -> Result<EnrichmentReport, EnrichError>
where
    J: Enricher,
{
    let pending = db.items_missing(J::FIELD).await?;
    let mut report = EnrichmentReport {
        pending: pending.len(),
        ..Default::default()
    };
    if pending.is_empty() {
        info!("No items missing {}", J::FIELD.column());
        return Ok(report);
    }
    info!("Computing {} for {} items", J::FIELD.column(), pending.len());

    let mut writes = Vec::with_capacity(pending.len());
    for item in &pending {
        match job.compute(item).await {
            Ok(value) => writes.push(DerivedWrite::for_item(item, value)),
            Err(EnrichError::EmptyOutput(item_id)) => {
                warn!("Empty {} for item {}; leaving it for a later run", J::FIELD.column(), item_id);
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }

        if let Some(sender) = &progress {
            // Ignore errors from sending (e.g., if receiver is dropped)
            let _ = sender.send(item.item_id).await;
        }
    }

    let outcome = db.apply_derived(&writes).await?;
    report.inserted = outcome.inserted;
    report.updated = outcome.updated;
    report.conflicts = outcome.conflicts;

    info!(
        "Stored {} for {} items ({} new, {} updated, {} conflicts)",
        J::FIELD.column(),
        report.written(),
        report.inserted,
        report.updated,
        report.conflicts
    );
    Ok(report)
}
