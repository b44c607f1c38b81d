use thiserror::Error;

use crate::models::RecordError;
use crate::types::TableName;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Could not connect to [{target}]: {source}")]
    Connectivity {
        target: String,
        #[source]
        source: BoxError
    },
    #[error("Schema initialization failed for table [{table}]: {source}")]
    Schema {
        table: String,
        #[source]
        source: BoxError
    },
    #[error("Insert of batch with [{rows}] rows into [{table}] failed: {source}")]
    Insert {
        table: String,
        rows: usize,
        #[source]
        source: BoxError
    },
    #[error("Query on [{table}] failed: {source}")]
    Query {
        table: String,
        #[source]
        source: BoxError
    },
    #[error("Row read from [{table}] failed validation: {source}")]
    InvalidRow {
        table: String,
        #[source]
        source: RecordError
    }
}

impl StorageError {
    //NOTE: Same factory approach as the other error enums, every variant carries the table it was raised for.

    pub fn connectivity(target: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Connectivity { target: target.into(), source: source.into() }
    }

    pub fn schema(table: &TableName, source: impl Into<BoxError>) -> Self {
        Self::Schema { table: table.to_string(), source: source.into() }
    }

    pub fn insert(table: &TableName, rows: usize, source: impl Into<BoxError>) -> Self {
        Self::Insert { table: table.to_string(), rows, source: source.into() }
    }

    pub fn query(table: &TableName, source: impl Into<BoxError>) -> Self {
        Self::Query { table: table.to_string(), source: source.into() }
    }

    pub fn invalid_row(table: &TableName, source: RecordError) -> Self {
        Self::InvalidRow { table: table.to_string(), source }
    }
}
