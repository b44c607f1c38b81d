use super::{schema_mismatches, ColumnInfo, MemoryStore, StorageError, TableSchema, TransactionStore};
use crate::models::{Checkpoint, PaymentMethod, Product, RecordDraft, TransactionRecord};
use crate::types::TableName;
use anyhow::Result;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

fn base_time() -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .and_then(|date| date.and_hms_opt(9, 0, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid base time"))
}

fn create_record(id: u128, offset_seconds: i64) -> Result<TransactionRecord> {
    Ok(TransactionRecord::try_from(RecordDraft {
        transaction_id: Uuid::from_u128(id),
        timestamp: base_time()? + Duration::seconds(offset_seconds),
        customer_name: format!("Customer {id}"),
        email: format!("customer{id}@example.com"),
        product: Product::Book,
        quantity: 1,
        price_per_unit: Decimal::from_str("12.50")?,
        payment_method: PaymentMethod::Crypto,
        city: "Lisbon".to_string(),
        country: "Portugal".to_string()
    })?)
}

fn create_records(ids: std::ops::RangeInclusive<u128>) -> Result<Vec<TransactionRecord>> {
    ids.map(|id| create_record(id, id as i64)).collect()
}

async fn ready_store() -> Result<MemoryStore> {
    let store = MemoryStore::new(TableName::default());
    store.ensure_schema().await?;
    Ok(store)
}

#[test]
fn test_create_table_sql_declares_every_column() -> Result<()> {
    let schema = TableSchema::new(TableName::from_str("sales.transactions")?);
    let sql = schema.create_table_sql();

    assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS sales.transactions ("));
    assert!(sql.contains("transaction_id UUID PRIMARY KEY"));
    assert!(sql.contains("timestamp TIMESTAMP NOT NULL"));
    assert!(sql.contains("price_per_unit DECIMAL(10, 2)"));
    assert_eq!(sql.matches("VARCHAR(255)").count(), 6);
    assert_eq!(schema.create_index_sql(), "CREATE INDEX IF NOT EXISTS transactions_timestamp_idx ON sales.transactions (timestamp, transaction_id)");

    Ok(())
}

#[test]
fn test_insert_prefix_lists_columns_in_schema_order() {
    let schema = TableSchema::new(TableName::default());

    assert_eq!(
        schema.insert_prefix(),
        "INSERT INTO public.transactions (transaction_id, timestamp, customer_name, email, product, quantity, price_per_unit, payment_method, city, country) "
    );
}

#[tokio::test]
async fn test_memory_store_requires_schema_before_writes() -> Result<()> {
    let store = MemoryStore::new(TableName::default());
    let result = store.insert_batch(&create_records(1..=2)?).await;

    assert!(matches!(result, Err(StorageError::Insert { rows: 2, .. })));
    assert!(matches!(store.count().await, Err(StorageError::Query { .. })));

    Ok(())
}

#[tokio::test]
async fn test_ensure_schema_is_idempotent() -> Result<()> {
    let store = MemoryStore::new(TableName::default());

    store.ensure_schema().await?;
    let first = store.describe_columns().await?;
    store.ensure_schema().await?;
    let second = store.describe_columns().await?;

    assert_eq!(first.len(), 10);
    assert_eq!(first, second);

    Ok(())
}

#[tokio::test]
async fn test_created_table_matches_its_own_schema() -> Result<()> {
    let store = ready_store().await?;

    assert!(schema_mismatches(&store.describe_columns().await?).is_empty());

    Ok(())
}

#[test]
fn test_schema_mismatches_name_each_problem() {
    let columns = vec![
        ColumnInfo { name: "transaction_id".to_string(), data_type: "character varying".to_string() },
        ColumnInfo { name: "quantity".to_string(), data_type: "INTEGER".to_string() }
    ];

    let problems = schema_mismatches(&columns);

    assert_eq!(problems.len(), 9);
    assert_eq!(problems[0], "transaction_id is character varying instead of uuid");
    assert!(problems.contains(&"timestamp is missing".to_string()));
    assert!(!problems.iter().any(|problem| problem.starts_with("quantity")));
}

#[tokio::test]
async fn test_inserted_rows_read_back_unchanged() -> Result<()> {
    let store = ready_store().await?;
    let records = create_records(1..=5)?;

    assert_eq!(store.insert_batch(&records).await?, 5);

    let ids: Vec<_> = records.iter().map(|record| record.transaction_id()).collect();
    let read_back = store.fetch_by_ids(&ids).await?;

    assert_eq!(read_back, records);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_identifier_rejects_whole_batch() -> Result<()> {
    let store = ready_store().await?;
    store.insert_batch(&create_records(1..=3)?).await?;

    let mut batch = create_records(4..=6)?;
    batch.push(create_record(2, 99)?);
    let result = store.insert_batch(&batch).await;

    assert!(matches!(result, Err(StorageError::Insert { rows: 4, .. })));
    assert_eq!(store.count().await?, 3);

    Ok(())
}

#[tokio::test]
async fn test_scheduled_failure_keeps_earlier_batches() -> Result<()> {
    let store = MemoryStore::new(TableName::default()).with_failure_at_batch(2);
    store.ensure_schema().await?;

    store.insert_batch(&create_records(1..=3)?).await?;
    assert!(store.insert_batch(&create_records(4..=6)?).await.is_err());
    store.insert_batch(&create_records(7..=9)?).await?;

    assert_eq!(store.count().await?, 6);
    assert!(store.fetch_by_ids(&[Uuid::from_u128(5)]).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_fetch_recent_returns_newest_rows_oldest_first() -> Result<()> {
    let store = ready_store().await?;
    store.insert_batch(&create_records(1..=10)?).await?;

    let recent = store.fetch_recent(3).await?;
    let ids: Vec<_> = recent.iter().map(|record| record.transaction_id().as_u128()).collect();

    assert_eq!(ids, vec![8, 9, 10]);
    assert_eq!(store.fetch_recent(50).await?.len(), 10);

    Ok(())
}

#[tokio::test]
async fn test_fetch_since_is_strictly_after_checkpoint() -> Result<()> {
    let store = ready_store().await?;
    store.insert_batch(&create_records(1..=6)?).await?;

    //NOTE: Same timestamp as row 3 but a higher identifier, so it sorts right after it.
    store.insert_batch(&[create_record(100, 3)?]).await?;

    let checkpoint = Checkpoint::new(base_time()? + Duration::seconds(3), Uuid::from_u128(3));
    let rows = store.fetch_since(&checkpoint, 3).await?;
    let ids: Vec<_> = rows.iter().map(|record| record.transaction_id().as_u128()).collect();

    assert_eq!(ids, vec![100, 4, 5]);

    Ok(())
}
