mod errors;
mod memory_store;
mod postgres_store;
mod schema;
#[cfg(test)]
mod tests;

use async_trait::async_trait;

use crate::models::{Checkpoint, TransactionRecord};
use crate::types::{TableName, TransactionId};

pub use errors::StorageError;
pub use memory_store::MemoryStore;
pub use postgres_store::PostgresStore;
pub use schema::{schema_mismatches, ColumnInfo, TableSchema};

/// Backend holding the transactions table.
///
/// Every batch handed to `insert_batch` is committed atomically: either all
/// of its rows become visible or none do. Reads return rows in ascending
/// `(timestamp, transaction_id)` order.
#[async_trait]
pub trait TransactionStore: Send + Sync {
    fn table(&self) -> &TableName;

    /// Creates the table and its index when absent. Safe to call repeatedly.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    async fn describe_columns(&self) -> Result<Vec<ColumnInfo>, StorageError>;

    /// Inserts all records in one transaction and returns the rows written.
    async fn insert_batch(&self, records: &[TransactionRecord]) -> Result<u64, StorageError>;

    /// The newest `limit` rows.
    async fn fetch_recent(&self, limit: usize) -> Result<Vec<TransactionRecord>, StorageError>;

    /// Up to `limit` rows strictly after `checkpoint`, oldest first.
    async fn fetch_since(&self, checkpoint: &Checkpoint, limit: usize) -> Result<Vec<TransactionRecord>, StorageError>;

    async fn fetch_by_ids(&self, ids: &[TransactionId]) -> Result<Vec<TransactionRecord>, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;
}
