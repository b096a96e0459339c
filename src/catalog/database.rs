//! Database operations for the catalog

use crate::catalog::error::DbError;
use crate::catalog::schema;
use crate::catalog::vector::{decode_vector, encode_vector};
use crate::catalog::{
    DerivedField, DerivedValue, DerivedWrite, InsertOutcome, Item, ItemDetail, ItemFilter,
    PendingItem, WriteOutcome,
};
use crate::extractor::ItemRecord;
use libsql::{params, Connection, Row, Rows};
use tracing::{debug, info, instrument, warn};

/// Item columns in the order `row_to_item` reads them, aliased to `i`
pub(crate) const ITEM_COLUMNS: &str = "i.id, i.name, i.price, i.rating, i.description, \
     i.category, i.external_code, i.availability, i.stock_count";

/// Database manager for the catalog
#[derive(Clone)]
pub struct Database {
    conn: Connection,
    dimensions: usize,
}

impl Database {
    /// Create a new database manager
    ///
    /// `dimensions` is the fixed embedding length of the `derived_attributes`
    /// table; it must match the embedding model.
    #[instrument(skip(conn))]
    pub async fn new(conn: Connection, dimensions: usize) -> Result<Self, DbError> {
        schema::enable_foreign_keys(&conn).await?;
        schema::initialize_schema(&conn, dimensions).await?;

        Ok(Self { conn, dimensions })
    }

    /// Create a new database manager from a path
    pub async fn new_from_path(path: &str, dimensions: usize) -> Result<Self, DbError> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DbError::Connection(format!("Failed to open database: {}", e)))?;

        let conn = db
            .connect()
            .map_err(|e| DbError::Connection(format!("Failed to connect to database: {}", e)))?;

        Self::new(conn, dimensions).await
    }

    /// Embedding length of this store
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Execute a custom query with parameters
    pub async fn execute_query<P>(&self, sql: &str, params: P) -> Result<Rows, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .query(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute query: {}", e)))
    }

    /// Execute a statement and return the number of rows changed
    pub async fn execute<P>(&self, sql: &str, params: P) -> Result<u64, DbError>
    where
        P: libsql::params::IntoParams,
    {
        self.conn
            .execute(sql, params)
            .await
            .map_err(|e| DbError::Query(format!("Failed to execute statement: {}", e)))
    }

    /// Insert scraped records, skipping external codes already stored
    ///
    /// All inserts happen in one transaction. Either every new record becomes
    /// visible or, on error, none does. Records without an external code
    /// cannot be deduplicated and are skipped.
    #[instrument(skip(self, records), fields(records = records.len()))]
    pub async fn insert_items(&self, records: &[ItemRecord]) -> Result<InsertOutcome, DbError> {
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        match stage_items(&tx, records).await {
            Ok(outcome) => {
                tx.commit().await.map_err(|e| {
                    DbError::Transaction(format!("Failed to commit transaction: {}", e))
                })?;
                info!(
                    "Inserted {} items, skipped {}",
                    outcome.inserted, outcome.skipped
                );
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Failed to roll back item batch: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Items whose derived `field` is missing
    ///
    /// An item counts as missing when it has no satellite row, or when its
    /// satellite row holds a null or empty value for the field.
    #[instrument(skip(self))]
    pub async fn items_missing(&self, field: DerivedField) -> Result<Vec<PendingItem>, DbError> {
        let missing = match field {
            DerivedField::Embedding => "d.embedding IS NULL OR length(d.embedding) = 0",
            DerivedField::Summary => "d.summary IS NULL OR trim(d.summary) = ''",
        };
        let sql = format!(
            "SELECT i.id, i.name, i.description, i.category, d.id
             FROM items i
             LEFT JOIN derived_attributes d ON d.item_id = i.id
             WHERE d.id IS NULL OR {}
             ORDER BY i.id",
            missing
        );

        let mut rows = self.execute_query(&sql, params![]).await?;
        let mut pending = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to read pending item: {}", e)))?
        {
            pending.push(PendingItem {
                item_id: get!(row, 0, "id")?,
                name: get!(row, 1, "name")?,
                description: get!(row, 2, "description")?,
                category: get!(row, 3, "category")?,
                satellite_id: get!(row, 4, "satellite id")?,
            });
        }

        debug!("{} items missing {}", pending.len(), field.column());
        Ok(pending)
    }

    /// Write a batch of derived attribute values in one transaction
    ///
    /// Existing satellite rows are updated in place; missing ones are
    /// inserted. An insert that finds a row created by a concurrent run is
    /// counted as a conflict and skipped.
    #[instrument(skip(self, writes), fields(writes = writes.len()))]
    pub async fn apply_derived(&self, writes: &[DerivedWrite]) -> Result<WriteOutcome, DbError> {
        for write in writes {
            if let DerivedValue::Embedding(values) = &write.value {
                if values.len() != self.dimensions {
                    return Err(DbError::Data(format!(
                        "Embedding for item {} has {} dimensions, expected {}",
                        write.item_id,
                        values.len(),
                        self.dimensions
                    )));
                }
            }
        }

        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DbError::Transaction(format!("Failed to start transaction: {}", e)))?;

        match stage_derived(&tx, writes).await {
            Ok(outcome) => {
                tx.commit().await.map_err(|e| {
                    DbError::Transaction(format!("Failed to commit transaction: {}", e))
                })?;
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Failed to roll back derived batch: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    /// Stored embedding of an item, if any
    pub async fn get_embedding(&self, item_id: i64) -> Result<Option<Vec<f32>>, DbError> {
        let mut rows = self
            .execute_query(
                "SELECT embedding FROM derived_attributes WHERE item_id = ?",
                params![item_id],
            )
            .await?;

        let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to get embedding: {}", e)))?
        else {
            return Ok(None);
        };

        let blob: Option<Vec<u8>> = get!(row, 0, "embedding")?;
        match blob.filter(|blob| !blob.is_empty()) {
            Some(blob) => decode_vector(&blob).map(Some).ok_or_else(|| {
                DbError::Data(format!("Corrupt embedding blob for item {}", item_id))
            }),
            None => Ok(None),
        }
    }

    /// List items matching a filter, ordered by id
    #[instrument(skip(self))]
    pub async fn list_items(&self, filter: &ItemFilter) -> Result<Vec<Item>, DbError> {
        let mut sql = format!("SELECT {} FROM items i WHERE 1=1", ITEM_COLUMNS);
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(min_price) = filter.min_price {
            sql.push_str(" AND i.price >= ?");
            params.push(min_price.into());
        }
        if let Some(max_price) = filter.max_price {
            sql.push_str(" AND i.price <= ?");
            params.push(max_price.into());
        }
        if let Some(min_rating) = filter.min_rating {
            sql.push_str(" AND i.rating >= ?");
            params.push(i64::from(min_rating).into());
        }
        if let Some(category) = &filter.category {
            // LIKE is case-insensitive for ASCII
            sql.push_str(" AND i.category LIKE ? ESCAPE '\\'");
            params.push(contains_pattern(category).into());
        }
        if let Some(q) = filter.q.as_deref().filter(|q| !q.is_empty()) {
            sql.push_str(" AND (i.name LIKE ? ESCAPE '\\' OR i.description LIKE ? ESCAPE '\\')");
            params.push(contains_pattern(q).into());
            params.push(contains_pattern(q).into());
        }

        sql.push_str(" ORDER BY i.id LIMIT ? OFFSET ?");
        params.push(i64::from(filter.effective_limit()).into());
        params.push(i64::from(filter.offset).into());

        let mut rows = self.execute_query(&sql, params).await?;
        let mut items = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to list items: {}", e)))?
        {
            items.push(row_to_item(&row)?);
        }
        Ok(items)
    }

    /// Get an item with its derived attributes
    pub async fn get_item(&self, id: i64) -> Result<Option<ItemDetail>, DbError> {
        let sql = format!(
            "SELECT {}, d.summary,
                    CASE WHEN d.embedding IS NOT NULL AND length(d.embedding) > 0 THEN 1 ELSE 0 END
             FROM items i
             LEFT JOIN derived_attributes d ON d.item_id = i.id
             WHERE i.id = ?",
            ITEM_COLUMNS
        );

        let mut rows = self.execute_query(&sql, params![id]).await?;
        match rows
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to get item: {}", e)))?
        {
            Some(row) => {
                let has_embedding: i64 = get!(row, 10, "has_embedding")?;
                Ok(Some(ItemDetail {
                    item: row_to_item(&row)?,
                    summary: get!(row, 9, "summary")?,
                    has_embedding: has_embedding != 0,
                }))
            }
            None => Ok(None),
        }
    }
}

/// Stage item inserts inside an open transaction
async fn stage_items(conn: &Connection, records: &[ItemRecord]) -> Result<InsertOutcome, DbError> {
    let mut outcome = InsertOutcome::default();

    for record in records {
        let Some(code) = record.external_code.as_deref() else {
            warn!("Skipping '{}': no external code", record.name);
            outcome.skipped += 1;
            continue;
        };

        let mut existing = conn
            .query("SELECT 1 FROM items WHERE external_code = ?", params![code])
            .await
            .map_err(|e| DbError::Query(format!("Failed to look up item: {}", e)))?;
        if existing
            .next()
            .await
            .map_err(|e| DbError::Data(format!("Failed to look up item: {}", e)))?
            .is_some()
        {
            debug!("Item {} already stored", code);
            outcome.skipped += 1;
            continue;
        }

        let changed = conn
            .execute(
                "INSERT INTO items
                 (name, price, rating, description, category, external_code, availability, stock_count)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                 ON CONFLICT(external_code) DO NOTHING",
                params![
                    record.name.clone(),
                    record.price,
                    record.rating.map(i64::from),
                    record.description.clone(),
                    record.category.clone(),
                    code,
                    record.availability.clone(),
                    record.stock_count.map(i64::from),
                ],
            )
            .await
            .map_err(|e| DbError::Query(format!("Failed to insert item: {}", e)))?;

        if changed == 0 {
            outcome.skipped += 1;
        } else {
            outcome.inserted += 1;
        }
    }

    Ok(outcome)
}

/// Stage derived attribute writes inside an open transaction
async fn stage_derived(conn: &Connection, writes: &[DerivedWrite]) -> Result<WriteOutcome, DbError> {
    let mut outcome = WriteOutcome::default();

    for write in writes {
        let column = write.value.field().column();
        let value = match &write.value {
            DerivedValue::Embedding(values) => libsql::Value::Blob(encode_vector(values)),
            DerivedValue::Summary(text) => libsql::Value::Text(text.clone()),
        };

        match write.satellite_id {
            Some(satellite_id) => {
                let sql = format!("UPDATE derived_attributes SET {} = ? WHERE id = ?", column);
                let changed = conn
                    .execute(&sql, params![value, satellite_id])
                    .await
                    .map_err(|e| DbError::Query(format!("Failed to update {}: {}", column, e)))?;
                if changed == 0 {
                    warn!("Satellite row {} vanished before update", satellite_id);
                    outcome.conflicts += 1;
                } else {
                    outcome.updated += 1;
                }
            }
            None => {
                let sql = format!(
                    "INSERT INTO derived_attributes (item_id, {}) VALUES (?, ?)
                     ON CONFLICT(item_id) DO NOTHING",
                    column
                );
                let changed = conn
                    .execute(&sql, params![write.item_id, value])
                    .await
                    .map_err(|e| DbError::Query(format!("Failed to insert {}: {}", column, e)))?;
                if changed == 0 {
                    warn!(
                        "Item {} gained a satellite row from another run; skipping",
                        write.item_id
                    );
                    outcome.conflicts += 1;
                } else {
                    outcome.inserted += 1;
                }
            }
        }
    }

    Ok(outcome)
}

/// `LIKE` pattern matching `text` literally anywhere, for use with `ESCAPE '\'`
fn contains_pattern(text: &str) -> String {
    let mut pattern = String::with_capacity(text.len() + 2);
    pattern.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Convert a row selected with `ITEM_COLUMNS` to an Item
pub(crate) fn row_to_item(row: &Row) -> Result<Item, DbError> {
    let rating: Option<i64> = get!(row, 3, "rating")?;
    let stock_count: Option<i64> = get!(row, 8, "stock_count")?;

    Ok(Item {
        id: get!(row, 0, "id")?,
        name: get!(row, 1, "name")?,
        price: get!(row, 2, "price")?,
        rating: rating
            .map(u8::try_from)
            .transpose()
            .map_err(|e| DbError::Data(format!("Invalid rating: {}", e)))?,
        description: get!(row, 4, "description")?,
        category: get!(row, 5, "category")?,
        external_code: get!(row, 6, "external_code")?,
        availability: get!(row, 7, "availability")?,
        stock_count: stock_count
            .map(u32::try_from)
            .transpose()
            .map_err(|e| DbError::Data(format!("Invalid stock count: {}", e)))?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use tempfile::tempdir;

    pub(crate) const TEST_DIMENSIONS: usize = 3;

    pub(crate) async fn setup_test_db() -> Result<(Database, tempfile::TempDir), DbError> {
        // Create a temporary directory for the database
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .to_string();

        let db = Database::new_from_path(&db_path, TEST_DIMENSIONS).await?;

        Ok((db, temp_dir))
    }

    pub(crate) fn record(code: &str, name: &str) -> ItemRecord {
        ItemRecord {
            name: name.to_string(),
            price: Some(10.0),
            rating: Some(3),
            description: Some(format!("About {}", name)),
            category: Some("Fiction".to_string()),
            external_code: Some(code.to_string()),
            availability: Some("In stock (5 available)".to_string()),
            stock_count: Some(5),
        }
    }

    async fn count(db: &Database, sql: &str) -> i64 {
        let mut rows = db.execute_query(sql, params![]).await.unwrap();
        let row = rows.next().await.unwrap().unwrap();
        row.get(0).unwrap()
    }

    #[tokio::test]
    async fn test_database_initialization() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let mut result = db
            .execute_query(
                "SELECT name FROM sqlite_master WHERE type='table' \
                 AND name IN ('items', 'derived_attributes')",
                params![],
            )
            .await
            .unwrap();

        let mut tables = Vec::new();
        while let Ok(Some(row)) = result.next().await {
            let table_name: String = row.get(0).unwrap();
            tables.push(table_name);
        }

        assert_eq!(tables.len(), 2);
        assert_eq!(db.dimensions(), TEST_DIMENSIONS);
    }

    #[tokio::test]
    async fn test_insert_same_record_twice() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let records = vec![record("upc-1", "First")];

        let first = db.insert_items(&records).await.unwrap();
        assert_eq!(first.inserted, 1);

        let second = db.insert_items(&records).await.unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 1);

        assert_eq!(count(&db, "SELECT COUNT(*) FROM items").await, 1);
    }

    #[tokio::test]
    async fn test_insert_is_first_write_wins() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let original = record("upc-1", "Original");
        let mut renamed = record("upc-1", "Renamed");
        renamed.price = Some(99.0);

        // Duplicate codes inside one batch as well as across batches
        let outcome = db
            .insert_items(&[original, renamed.clone()])
            .await
            .unwrap();
        assert_eq!(outcome.inserted, 1);
        assert_eq!(outcome.skipped, 1);
        db.insert_items(&[renamed]).await.unwrap();

        let items = db.list_items(&ItemFilter::default()).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Original");
        assert_eq!(items[0].price, Some(10.0));
    }

    #[tokio::test]
    async fn test_insert_skips_records_without_code() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let mut no_code = record("unused", "No Code");
        no_code.external_code = None;

        let outcome = db.insert_items(&[no_code]).await.unwrap();
        assert_eq!(outcome, InsertOutcome { inserted: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_no_rows() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        let mut bad = record("upc-2", "Bad Rating");
        bad.rating = Some(9);

        let result = db.insert_items(&[record("upc-1", "Good"), bad]).await;
        assert!(result.is_err());
        assert_eq!(count(&db, "SELECT COUNT(*) FROM items").await, 0);
    }

    #[tokio::test]
    async fn test_items_missing_and_apply_derived() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.insert_items(&[record("a", "A"), record("b", "B")])
            .await
            .unwrap();

        let pending = db.items_missing(DerivedField::Embedding).await.unwrap();
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|p| p.satellite_id.is_none()));

        let writes: Vec<DerivedWrite> = pending
            .iter()
            .map(|p| DerivedWrite::for_item(p, DerivedValue::Embedding(vec![1.0, 2.0, 3.0])))
            .collect();
        let outcome = db.apply_derived(&writes).await.unwrap();
        assert_eq!(outcome.inserted, 2);

        assert!(db
            .items_missing(DerivedField::Embedding)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            db.get_embedding(pending[0].item_id).await.unwrap(),
            Some(vec![1.0, 2.0, 3.0])
        );

        // Satellite rows exist now, but summaries are still null
        let pending_summaries = db.items_missing(DerivedField::Summary).await.unwrap();
        assert_eq!(pending_summaries.len(), 2);
        assert!(pending_summaries.iter().all(|p| p.satellite_id.is_some()));

        let writes: Vec<DerivedWrite> = pending_summaries
            .iter()
            .map(|p| DerivedWrite::for_item(p, DerivedValue::Summary("Read me".to_string())))
            .collect();
        let outcome = db.apply_derived(&writes).await.unwrap();
        assert_eq!(outcome.updated, 2);
        assert_eq!(outcome.inserted, 0);

        assert_eq!(count(&db, "SELECT COUNT(*) FROM derived_attributes").await, 2);
    }

    #[tokio::test]
    async fn test_empty_summary_counts_as_missing() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.insert_items(&[record("a", "A")]).await.unwrap();
        let item_id = db.list_items(&ItemFilter::default()).await.unwrap()[0].id;

        db.execute(
            "INSERT INTO derived_attributes (item_id, summary) VALUES (?, '')",
            params![item_id],
        )
        .await
        .unwrap();

        let pending = db.items_missing(DerivedField::Summary).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].satellite_id.is_some());
    }

    #[tokio::test]
    async fn test_insert_conflict_is_benign() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.insert_items(&[record("a", "A")]).await.unwrap();
        let pending = db.items_missing(DerivedField::Summary).await.unwrap();

        // Another run creates the satellite row after our pending scan
        db.execute(
            "INSERT INTO derived_attributes (item_id, summary) VALUES (?, 'theirs')",
            params![pending[0].item_id],
        )
        .await
        .unwrap();

        let write = DerivedWrite::for_item(&pending[0], DerivedValue::Summary("ours".to_string()));
        let outcome = db.apply_derived(&[write]).await.unwrap();
        assert_eq!(outcome.conflicts, 1);
        assert_eq!(count(&db, "SELECT COUNT(*) FROM derived_attributes").await, 1);
    }

    #[tokio::test]
    async fn test_apply_derived_rejects_wrong_dimensions() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.insert_items(&[record("a", "A")]).await.unwrap();
        let pending = db.items_missing(DerivedField::Embedding).await.unwrap();

        let write = DerivedWrite::for_item(&pending[0], DerivedValue::Embedding(vec![1.0]));
        assert!(matches!(
            db.apply_derived(&[write]).await,
            Err(DbError::Data(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_item_cascades() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.insert_items(&[record("a", "A")]).await.unwrap();
        let pending = db.items_missing(DerivedField::Summary).await.unwrap();
        db.apply_derived(&[DerivedWrite::for_item(
            &pending[0],
            DerivedValue::Summary("x".to_string()),
        )])
        .await
        .unwrap();

        db.execute("DELETE FROM items WHERE id = ?", params![pending[0].item_id])
            .await
            .unwrap();
        assert_eq!(count(&db, "SELECT COUNT(*) FROM derived_attributes").await, 0);
    }

    #[tokio::test]
    async fn test_list_items_filters() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let mut cheap = record("1", "Cheap Poems");
        cheap.price = Some(5.0);
        cheap.rating = Some(2);
        cheap.category = Some("Poetry".to_string());

        let mut pricey = record("2", "Pricey Mystery");
        pricey.price = Some(50.0);
        pricey.rating = Some(5);
        pricey.category = Some("Mystery".to_string());
        pricey.description = Some("A detective story".to_string());

        let mut middle = record("3", "Middle");
        middle.price = Some(20.0);
        middle.rating = Some(4);
        middle.category = Some("Historical Fiction".to_string());

        db.insert_items(&[cheap, pricey, middle]).await.unwrap();

        let names = |items: Vec<Item>| items.into_iter().map(|i| i.name).collect::<Vec<_>>();

        let filter = ItemFilter {
            min_price: Some(10.0),
            ..Default::default()
        };
        assert_eq!(
            names(db.list_items(&filter).await.unwrap()),
            vec!["Pricey Mystery", "Middle"]
        );

        let filter = ItemFilter {
            max_price: Some(30.0),
            min_rating: Some(3),
            ..Default::default()
        };
        assert_eq!(names(db.list_items(&filter).await.unwrap()), vec!["Middle"]);

        let filter = ItemFilter {
            category: Some("fiction".to_string()),
            ..Default::default()
        };
        assert_eq!(names(db.list_items(&filter).await.unwrap()), vec!["Middle"]);

        let filter = ItemFilter {
            q: Some("DETECTIVE".to_string()),
            ..Default::default()
        };
        assert_eq!(
            names(db.list_items(&filter).await.unwrap()),
            vec!["Pricey Mystery"]
        );

        let filter = ItemFilter {
            offset: 1,
            limit: Some(1),
            ..Default::default()
        };
        assert_eq!(
            names(db.list_items(&filter).await.unwrap()),
            vec!["Pricey Mystery"]
        );
    }

    #[tokio::test]
    async fn test_list_items_matches_wildcards_literally() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();

        let mut percent = record("1", "100% Cotton");
        percent.category = Some("Sci_Fi".to_string());
        let mut plain = record("2", "1000 Cotton Threads");
        plain.category = Some("SciXFi".to_string());
        db.insert_items(&[percent, plain]).await.unwrap();

        let names = |items: Vec<Item>| items.into_iter().map(|i| i.name).collect::<Vec<_>>();

        let filter = ItemFilter {
            q: Some("100%".to_string()),
            ..Default::default()
        };
        assert_eq!(names(db.list_items(&filter).await.unwrap()), vec!["100% Cotton"]);

        let filter = ItemFilter {
            category: Some("sci_fi".to_string()),
            ..Default::default()
        };
        assert_eq!(names(db.list_items(&filter).await.unwrap()), vec!["100% Cotton"]);
    }

    #[test]
    fn test_contains_pattern_escapes() {
        assert_eq!(contains_pattern("a%b_c\\d"), "%a\\%b\\_c\\\\d%");
    }

    #[tokio::test]
    async fn test_get_item_detail() {
        let (db, _temp_dir) = setup_test_db().await.unwrap();
        db.insert_items(&[record("a", "A")]).await.unwrap();
        let pending = db.items_missing(DerivedField::Summary).await.unwrap();
        let item_id = pending[0].item_id;

        let detail = db.get_item(item_id).await.unwrap().unwrap();
        assert_eq!(detail.item.name, "A");
        assert_eq!(detail.item.stock_count, Some(5));
        assert_eq!(detail.summary, None);
        assert!(!detail.has_embedding);

        db.apply_derived(&[DerivedWrite::for_item(
            &pending[0],
            DerivedValue::Summary("Catchy".to_string()),
        )])
        .await
        .unwrap();

        let detail = db.get_item(item_id).await.unwrap().unwrap();
        assert_eq!(detail.summary.as_deref(), Some("Catchy"));
        assert!(db.get_item(item_id + 100).await.unwrap().is_none());
    }
}
