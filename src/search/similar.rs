use clap::ValueEnum;
use libsql::{params, Value};
use serde::Serialize;
use tracing::{debug, instrument};

use super::SearchError;
use crate::catalog::vector::encode_vector;
use crate::catalog::{row_to_item, Database, Item, ITEM_COLUMNS};

/// Vector distance used to rank neighbours
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// Cosine distance, `1 - cos(a, b)`
    #[default]
    Cosine,
    /// Euclidean distance
    L2,
}

impl DistanceMetric {
    /// libsql function computing this distance
    pub fn sql_function(self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "vector_distance_cos",
            DistanceMetric::L2 => "vector_distance_l2",
        }
    }
}

/// A neighbour of the queried item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarItem {
    #[serde(flatten)]
    pub item: Item,
    /// `None` when the distance is undefined, e.g. cosine against a zero vector
    pub distance: Option<f64>,
}

/// Find up to `k` other items closest to `item_id`
///
/// Results are ordered by increasing distance, then by item id; candidates
/// whose distance is undefined come last. Items without an embedding are
/// never candidates. Returns an empty list when
/// the queried item has no embedding, or fewer than `k` entries when fewer
/// candidates exist.
#[instrument(skip(db))]
pub async fn similar_items(
    db: &Database,
    item_id: i64,
    k: usize,
    metric: DistanceMetric,
) -> Result<Vec<SimilarItem>, SearchError> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let Some(embedding) = db.get_embedding(item_id).await? else {
        debug!("Item {} has no embedding yet", item_id);
        return Ok(Vec::new());
    };

    let sql = format!(
        "SELECT {}, {}(d.embedding, ?) AS distance
         FROM items i
         JOIN derived_attributes d ON d.item_id = i.id
         WHERE d.embedding IS NOT NULL AND length(d.embedding) > 0 AND i.id != ?
         ORDER BY distance IS NULL, distance, i.id
         LIMIT ?",
        ITEM_COLUMNS,
        metric.sql_function()
    );

    let mut rows = db
        .execute_query(
            &sql,
            params![Value::Blob(encode_vector(&embedding)), item_id, k as i64],
        )
        .await?;

    let mut results = Vec::with_capacity(k);
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| SearchError::ResultProcessing(e.to_string()))?
    {
        let distance: Option<f64> = row.get(9).map_err(|e| {
            SearchError::ResultProcessing(format!("Failed to get distance: {}", e))
        })?;
        results.push(SimilarItem {
            item: row_to_item(&row)?,
            distance,
        });
    }

    debug!("Found {} neighbours of item {}", results.len(), item_id);
    Ok(results)
}
