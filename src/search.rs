//! # Similarity Search Module
//!
//! Nearest-neighbour recommendations over stored item embeddings. Given an
//! item id, `similar_items` looks up that item's embedding and lets libsql
//! rank every other embedded item by vector distance to it.
//!
//! An item without an embedding yet has no neighbours: the result is empty,
//! not an error.
//!
//! ## Example
//!
//! ```no_run
//! use folio::catalog::Database;
//! use folio::search::{similar_items, DistanceMetric};
//!
//! # async fn example() -> folio::prelude::Result<()> {
//! let db = Database::new_from_path("catalog.db", 384).await?;
//! for hit in similar_items(&db, 1, 5, DistanceMetric::Cosine).await? {
//!     println!("{:?} {}", hit.distance, hit.item.name);
//! }
//! # Ok(())
//! # }
//! ```

mod error;
mod similar;

pub use error::SearchError;
pub use similar::{similar_items, DistanceMetric, SimilarItem};
