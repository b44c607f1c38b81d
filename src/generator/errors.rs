use thiserror::Error;

use crate::models::RecordError;
use crate::storage::StorageError;
use crate::types::BatchNumber;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Invalid load configuration: {0}")]
    InvalidConfig(String),
    #[error("Synthetic record failed validation: {0}")]
    Record(#[from] RecordError),
    #[error("Batch [{batch}] failed after [{committed_rows}] rows were committed: {source}")]
    Insert {
        batch: BatchNumber,
        committed_rows: u64,
        #[source]
        source: StorageError
    },
    #[error("Could not write metrics: {0}")]
    Metrics(#[from] csv::Error)
}

impl GeneratorError {
    pub fn insert(batch: BatchNumber, committed_rows: u64, source: StorageError) -> Self {
        Self::Insert { batch, committed_rows, source }
    }
}
