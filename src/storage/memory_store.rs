use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{Checkpoint, TransactionRecord};
use crate::storage::schema::{ColumnInfo, TableSchema, TRANSACTION_COLUMNS};
use crate::storage::{StorageError, TransactionStore};
use crate::types::{TableName, TransactionId};

/// In-process stand-in for the PostgreSQL table.
///
/// Mirrors the guarantees the pipeline relies on: the table must be created
/// before use, identifiers are a primary key and batches are all-or-nothing.
/// A failure can be scheduled for a given batch to exercise error paths.
pub struct MemoryStore {
    schema: TableSchema,
    rows: DashMap<TransactionId, TransactionRecord>,
    schema_ready: AtomicBool,
    batches_attempted: AtomicU64,
    fail_at_batch: Option<u64>,
    commit_lock: Mutex<()>
}

impl MemoryStore {
    pub fn new(table: TableName) -> Self {
        Self {
            schema: TableSchema::new(table),
            rows: DashMap::new(),
            schema_ready: AtomicBool::new(false),
            batches_attempted: AtomicU64::new(0),
            fail_at_batch: None,
            commit_lock: Mutex::new(())
        }
    }

    /// Makes the `batch`-th call to `insert_batch` (1-based) fail as if the
    /// connection dropped mid-transaction.
    #[cfg(test)]
    pub fn with_failure_at_batch(mut self, batch: u64) -> Self {
        self.fail_at_batch = Some(batch);
        self
    }

    fn require_table(&self) -> Result<(), String> {
        if self.schema_ready.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(format!("relation \"{}\" does not exist", self.schema.table()))
        }
    }

    fn sorted_rows(&self) -> Vec<TransactionRecord> {
        let mut rows: Vec<_> = self.rows.iter().map(|item| item.value().clone()).collect();
        rows.sort_by_key(|record| record.checkpoint());
        rows
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    fn table(&self) -> &TableName {
        self.schema.table()
    }

    async fn ensure_schema(&self) -> Result<(), StorageError> {
        self.schema_ready.store(true, Ordering::Release);
        Ok(())
    }

    async fn describe_columns(&self) -> Result<Vec<ColumnInfo>, StorageError> {
        if !self.schema_ready.load(Ordering::Acquire) {
            return Ok(Vec::new());
        }

        Ok(TRANSACTION_COLUMNS.iter()
            .map(|column| ColumnInfo {
                name: column.name.to_string(),
                data_type: column.catalog_type.to_string()
            })
            .collect())
    }

    async fn insert_batch(&self, records: &[TransactionRecord]) -> Result<u64, StorageError> {
        let table = self.schema.table();
        let _guard = self.commit_lock.lock().await;
        let batch = self.batches_attempted.fetch_add(1, Ordering::AcqRel) + 1;

        self.require_table().map_err(|reason| StorageError::insert(table, records.len(), reason))?;

        if self.fail_at_batch == Some(batch) {
            return Err(StorageError::insert(table, records.len(), "connection reset by peer"));
        }

        let mut seen = HashSet::with_capacity(records.len());

        for record in records {
            let id = record.transaction_id();

            if !seen.insert(id) || self.rows.contains_key(&id) {
                return Err(StorageError::insert(
                    table,
                    records.len(),
                    format!("duplicate key value violates unique constraint on transaction_id [{id}]")
                ));
            }
        }

        for record in records {
            self.rows.insert(record.transaction_id(), record.clone());
        }

        debug!("Committed batch [{batch}] with [{}] rows into [{table}]", records.len());

        Ok(records.len() as u64)
    }

    async fn fetch_recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, StorageError> {
        self.require_table().map_err(|reason| StorageError::query(self.schema.table(), reason))?;

        let rows = self.sorted_rows();
        let skip = rows.len().saturating_sub(limit);

        Ok(rows.into_iter().skip(skip).collect())
    }

    async fn fetch_since(&self, checkpoint: &Checkpoint, limit: usize) -> Result<Vec<TransactionRecord>, StorageError> {
        self.require_table().map_err(|reason| StorageError::query(self.schema.table(), reason))?;

        Ok(self.sorted_rows()
            .into_iter()
            .filter(|record| record.checkpoint() > *checkpoint)
            .take(limit)
            .collect())
    }

    async fn fetch_by_ids(&self, ids: &[TransactionId]) -> Result<Vec<TransactionRecord>, StorageError> {
        self.require_table().map_err(|reason| StorageError::query(self.schema.table(), reason))?;

        let mut rows: Vec<_> = ids.iter()
            .filter_map(|id| self.rows.get(id).map(|item| item.value().clone()))
            .collect();
        rows.sort_by_key(|record| record.checkpoint());
        rows.dedup_by_key(|record| record.transaction_id());

        Ok(rows)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        self.require_table().map_err(|reason| StorageError::query(self.schema.table(), reason))?;

        Ok(self.rows.len() as u64)
    }
}
