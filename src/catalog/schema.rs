//! # Database Schema Module
//!
//! Creates the two catalog tables:
//! 1. `items` - One row per scraped item, deduplicated by `external_code`
//! 2. `derived_attributes` - At most one row per item holding its embedding
//!    and generated summary; deleted with its item
//!
//! Embeddings use libsql's `F32_BLOB(n)` column type so the native vector
//! distance functions can rank them. No ANN index is created; similarity
//! queries scan the table exactly.

use crate::catalog::error::DbError;
use libsql::{params, Connection};

/// Turn on referential integrity for this connection
pub async fn enable_foreign_keys(conn: &Connection) -> Result<(), DbError> {
    conn.execute("PRAGMA foreign_keys = ON", params![])
        .await
        .map_err(|e| DbError::Schema(format!("Failed to enable foreign keys: {}", e)))?;
    Ok(())
}

/// Initialize the database schema
pub async fn initialize_schema(conn: &Connection, dimensions: usize) -> Result<(), DbError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS items (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            price REAL,
            rating INTEGER CHECK (rating IS NULL OR rating BETWEEN 1 AND 5),
            description TEXT,
            category TEXT,
            external_code TEXT UNIQUE,
            availability TEXT,
            stock_count INTEGER CHECK (stock_count IS NULL OR stock_count >= 0)
        )",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create items table: {}", e)))?;

    // Column types cannot be bound as parameters
    let derived_table = format!(
        "CREATE TABLE IF NOT EXISTS derived_attributes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id INTEGER NOT NULL UNIQUE,
            summary TEXT,
            embedding F32_BLOB({}),
            FOREIGN KEY (item_id) REFERENCES items(id) ON DELETE CASCADE
        )",
        dimensions
    );
    conn.execute(&derived_table, params![])
        .await
        .map_err(|e| DbError::Schema(format!("Failed to create derived_attributes table: {}", e)))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_items_category ON items(category)",
        params![],
    )
    .await
    .map_err(|e| DbError::Schema(format!("Failed to create index on items category: {}", e)))?;

    Ok(())
}
