use super::{probe_records, verify, CheckStage, ConnectivityError, PROBE_ROWS};
use crate::models::{Checkpoint, TransactionRecord};
use crate::storage::{ColumnInfo, MemoryStore, StorageError, TransactionStore};
use crate::types::{TableName, TransactionId};
use anyhow::Result;
use async_trait::async_trait;

/// A memory store whose catalog reports someone else's column layout.
struct ForeignTableStore {
    inner: MemoryStore,
    columns: Vec<(&'static str, &'static str)>
}

impl ForeignTableStore {
    fn new(columns: Vec<(&'static str, &'static str)>) -> Self {
        Self { inner: MemoryStore::new(TableName::default()), columns }
    }
}

#[async_trait]
impl TransactionStore for ForeignTableStore {
    fn table(&self) -> &TableName {
        self.inner.table()
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.inner.ensure_schema().await
    }

    async fn describe_columns(&self) -> Result<Vec<ColumnInfo>, StorageError> {
        Ok(self.columns.iter()
            .map(|(name, data_type)| ColumnInfo { name: name.to_string(), data_type: data_type.to_string() })
            .collect())
    }

    async fn insert_batch(&self, records: &[TransactionRecord]) -> Result<u64, StorageError> {
        self.inner.insert_batch(records).await
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, StorageError> {
        self.inner.fetch_recent(limit).await
    }

    async fn fetch_since(&self, checkpoint: &Checkpoint, limit: usize) -> Result<Vec<TransactionRecord>, StorageError> {
        self.inner.fetch_since(checkpoint, limit).await
    }

    async fn fetch_by_ids(&self, ids: &[TransactionId]) -> Result<Vec<TransactionRecord>, StorageError> {
        self.inner.fetch_by_ids(ids).await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.inner.count().await
    }
}

fn expected_columns() -> Vec<(&'static str, &'static str)> {
    vec![
        ("transaction_id", "uuid"),
        ("timestamp", "timestamp without time zone"),
        ("customer_name", "character varying"),
        ("email", "character varying"),
        ("product", "character varying"),
        ("quantity", "integer"),
        ("price_per_unit", "numeric"),
        ("payment_method", "character varying"),
        ("city", "character varying"),
        ("country", "character varying")
    ]
}

#[tokio::test]
async fn test_verify_creates_table_and_round_trips_probes() -> Result<()> {
    let store = MemoryStore::new(TableName::default());
    let probes = probe_records(PROBE_ROWS)?;

    let report = verify(&store, &probes).await?;

    assert_eq!(report.table, "public.transactions");
    assert_eq!(report.columns.len(), 10);
    assert_eq!(report.probe_rows, 2);
    assert_eq!(report.total_rows, 2);

    Ok(())
}

#[tokio::test]
async fn test_verify_twice_is_harmless() -> Result<()> {
    let store = MemoryStore::new(TableName::default());

    let first = verify(&store, &probe_records(PROBE_ROWS)?).await?;
    let second = verify(&store, &probe_records(PROBE_ROWS)?).await?;

    assert_eq!(first.columns, second.columns);
    assert_eq!(second.total_rows, 4);

    Ok(())
}

#[tokio::test]
async fn test_verify_without_probes_writes_nothing() -> Result<()> {
    let store = MemoryStore::new(TableName::default());
    let report = verify(&store, &[]).await?;

    assert_eq!(report.probe_rows, 0);
    assert_eq!(store.count().await?, 0);
    assert!(report.to_string().contains("rows in table: 0"));

    Ok(())
}

#[tokio::test]
async fn test_probe_write_failure_names_the_stage() -> Result<()> {
    let store = MemoryStore::new(TableName::default()).with_failure_at_batch(1);
    let result = verify(&store, &probe_records(PROBE_ROWS)?).await;

    assert!(matches!(result, Err(ConnectivityError::Storage { stage: CheckStage::ProbeInsert, .. })));

    Ok(())
}

#[tokio::test]
async fn test_verify_rejects_a_table_with_unrelated_columns() -> Result<()> {
    let store = ForeignTableStore::new(vec![("id", "integer"), ("name", "text")]);
    let result = verify(&store, &[]).await;

    let Err(ConnectivityError::SchemaMismatch { table, problems }) = result else {
        anyhow::bail!("expected a schema mismatch, got {result:?}");
    };

    assert_eq!(table, "public.transactions");
    assert_eq!(problems.len(), 10);
    assert!(problems.contains(&"transaction_id is missing".to_string()));

    Ok(())
}

#[tokio::test]
async fn test_verify_rejects_a_text_transaction_id() -> Result<()> {
    let mut columns = expected_columns();
    columns[0] = ("transaction_id", "character varying");

    let store = ForeignTableStore::new(columns);
    let error = verify(&store, &probe_records(PROBE_ROWS)?).await.err();

    assert!(matches!(&error, Some(ConnectivityError::SchemaMismatch { problems, .. }) if problems.len() == 1));
    assert!(error.map(|error| error.to_string()).unwrap_or_default().contains("transaction_id is character varying instead of uuid"));
    assert_eq!(store.inner.count().await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_verify_tolerates_extra_columns() -> Result<()> {
    let mut columns = expected_columns();
    columns.push(("loyalty_tier", "text"));

    let report = verify(&ForeignTableStore::new(columns), &[]).await?;

    assert_eq!(report.columns.len(), 11);

    Ok(())
}
