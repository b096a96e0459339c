//! # Catalog Analytics
//!
//! Aggregate views over the stored items. Each view is a plain async
//! function returning serializable rows; the `TRENDS` registry names them so
//! callers can run one by key.

use crate::catalog::error::DbError;
use crate::catalog::Database;
use libsql::params;
use serde::Serialize;
use serde_json::Value;
use tracing::instrument;

/// Minimum number of priced and rated items for a decile breakdown
const MIN_DECILE_SAMPLES: usize = 10;

/// A named analytics view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Trend {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// All available trends
pub const TRENDS: [Trend; 5] = [
    Trend {
        key: "price_by_rating_decile",
        name: "Average rating by price decile",
        description: "Splits prices into ten deciles and averages the rating within each",
    },
    Trend {
        key: "top_categories",
        name: "Most common categories",
        description: "The three categories with the most items",
    },
    Trend {
        key: "average_price_by_category",
        name: "Average price by category",
        description: "Mean price of the priced items in each category",
    },
    Trend {
        key: "average_rating_by_category",
        name: "Average rating of popular categories",
        description: "Mean rating of categories holding at least three items, best first",
    },
    Trend {
        key: "highest_rated_books_per_category",
        name: "Highest rated item per category",
        description: "One top-rated item per category, lowest id on ties",
    },
];

/// Rating summary of one price decile
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecileStat {
    pub price_range: [f64; 2],
    /// `None` when no item falls into the decile
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCount {
    pub category: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryPrice {
    pub category: Option<String>,
    pub average_price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRating {
    pub category: Option<String>,
    pub book_count: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopRated {
    pub id: i64,
    pub name: String,
    pub category: Option<String>,
    pub rating: i64,
}

/// Run a trend by key and return its rows as JSON
pub async fn run_trend(db: &Database, key: &str) -> Result<Value, DbError> {
    match key {
        "price_by_rating_decile" => to_json(average_rating_by_price_decile(db).await?),
        "top_categories" => to_json(most_common_categories(db, 3).await?),
        "average_price_by_category" => to_json(average_price_by_category(db).await?),
        "average_rating_by_category" => to_json(average_rating_by_category(db, 3).await?),
        "highest_rated_books_per_category" => to_json(highest_rated_per_category(db).await?),
        _ => Err(DbError::UnknownTrend(key.to_string())),
    }
}

fn to_json<T: Serialize>(rows: T) -> Result<Value, DbError> {
    serde_json::to_value(rows).map_err(|e| DbError::Data(format!("Failed to encode trend: {}", e)))
}

/// Linear-interpolated percentile of sorted values, `pct` in 0..=100
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    sorted[lower] + (sorted[upper] - sorted[lower]) * (rank - lower as f64)
}

/// Compute ten price deciles and the mean rating inside each
///
/// The last decile is closed on both ends so the maximum price is counted.
pub fn price_deciles(samples: &[(f64, i64)]) -> Vec<DecileStat> {
    if samples.len() < MIN_DECILE_SAMPLES {
        return Vec::new();
    }

    let mut prices: Vec<f64> = samples.iter().map(|(price, _)| *price).collect();
    prices.sort_by(|a, b| a.total_cmp(b));
    let edges: Vec<f64> = (0..=10)
        .map(|i| percentile(&prices, f64::from(i * 10)))
        .collect();

    (0..10)
        .map(|i| {
            let (low, high) = (edges[i], edges[i + 1]);
            let ratings: Vec<i64> = samples
                .iter()
                .filter(|(price, _)| *price >= low && (*price < high || (i == 9 && *price <= high)))
                .map(|(_, rating)| *rating)
                .collect();
            let average_rating = if ratings.is_empty() {
                None
            } else {
                Some(ratings.iter().sum::<i64>() as f64 / ratings.len() as f64)
            };
            DecileStat {
                price_range: [low, high],
                average_rating,
            }
        })
        .collect()
}

#[instrument(skip(db))]
pub async fn average_rating_by_price_decile(db: &Database) -> Result<Vec<DecileStat>, DbError> {
    let mut rows = db
        .execute_query(
            "SELECT price, rating FROM items WHERE price IS NOT NULL AND rating IS NOT NULL",
            params![],
        )
        .await?;

    let mut samples: Vec<(f64, i64)> = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DbError::Data(format!("Failed to read prices: {}", e)))?
    {
        samples.push((get!(row, 0, "price")?, get!(row, 1, "rating")?));
    }

    Ok(price_deciles(&samples))
}

#[instrument(skip(db))]
pub async fn most_common_categories(db: &Database, k: u32) -> Result<Vec<CategoryCount>, DbError> {
    let mut rows = db
        .execute_query(
            "SELECT category, COUNT(*) AS n FROM items
             GROUP BY category
             ORDER BY n DESC, category ASC
             LIMIT ?",
            params![i64::from(k)],
        )
        .await?;

    let mut counts = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DbError::Data(format!("Failed to read categories: {}", e)))?
    {
        counts.push(CategoryCount {
            category: get!(row, 0, "category")?,
            count: get!(row, 1, "count")?,
        });
    }
    Ok(counts)
}

#[instrument(skip(db))]
pub async fn average_price_by_category(db: &Database) -> Result<Vec<CategoryPrice>, DbError> {
    let mut rows = db
        .execute_query(
            "SELECT category, AVG(price) FROM items
             WHERE price IS NOT NULL
             GROUP BY category
             ORDER BY category",
            params![],
        )
        .await?;

    let mut prices = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DbError::Data(format!("Failed to read prices: {}", e)))?
    {
        prices.push(CategoryPrice {
            category: get!(row, 0, "category")?,
            average_price: get!(row, 1, "average_price")?,
        });
    }
    Ok(prices)
}

/// Mean rating of categories with at least `min_count` items, best first
#[instrument(skip(db))]
pub async fn average_rating_by_category(
    db: &Database,
    min_count: u32,
) -> Result<Vec<CategoryRating>, DbError> {
    let mut rows = db
        .execute_query(
            "SELECT category, COUNT(*), AVG(rating) AS avg_rating FROM items
             GROUP BY category
             HAVING COUNT(*) >= ?
             ORDER BY avg_rating DESC, category ASC",
            params![i64::from(min_count)],
        )
        .await?;

    let mut ratings = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DbError::Data(format!("Failed to read ratings: {}", e)))?
    {
        ratings.push(CategoryRating {
            category: get!(row, 0, "category")?,
            book_count: get!(row, 1, "book_count")?,
            average_rating: get!(row, 2, "average_rating")?,
        });
    }
    Ok(ratings)
}

/// Exactly one highest-rated item per category
#[instrument(skip(db))]
pub async fn highest_rated_per_category(db: &Database) -> Result<Vec<TopRated>, DbError> {
    let mut rows = db
        .execute_query(
            "SELECT id, name, category, rating FROM (
                SELECT id, name, category, rating,
                       RANK() OVER (PARTITION BY category ORDER BY rating DESC, id ASC) AS rnk
                FROM items
                WHERE rating IS NOT NULL
             )
             WHERE rnk = 1
             ORDER BY category",
            params![],
        )
        .await?;

    let mut top = Vec::new();
    while let Some(row) = rows
        .next()
        .await
        .map_err(|e| DbError::Data(format!("Failed to read top rated: {}", e)))?
    {
        top.push(TopRated {
            id: get!(row, 0, "id")?,
            name: get!(row, 1, "name")?,
            category: get!(row, 2, "category")?,
            rating: get!(row, 3, "rating")?,
        });
    }
    Ok(top)
}
