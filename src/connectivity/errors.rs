use std::fmt;
use std::fmt::{Display, Formatter};

use thiserror::Error;

use crate::models::RecordError;
use crate::storage::StorageError;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CheckStage {
    Schema,
    ProbeInsert,
    ProbeRead,
    RowCount
}

impl Display for CheckStage {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match self {
            CheckStage::Schema => write!(formatter, "schema"),
            CheckStage::ProbeInsert => write!(formatter, "probe insert"),
            CheckStage::ProbeRead => write!(formatter, "probe read"),
            CheckStage::RowCount => write!(formatter, "row count")
        }
    }
}

#[derive(Debug, Error)]
pub enum ConnectivityError {
    #[error("Connectivity check failed at [{stage}]: {source}")]
    Storage {
        stage: CheckStage,
        #[source]
        source: StorageError
    },
    #[error("Table [{table}] does not match the transactions schema: {}", problems.join("; "))]
    SchemaMismatch {
        table: String,
        problems: Vec<String>
    },
    #[error("Connectivity check could not build probe rows: {0}")]
    Probe(#[from] RecordError),
    #[error("Connectivity check read back {found} of {expected} probe rows, or their values differed")]
    ProbeMismatch {
        expected: usize,
        found: usize
    }
}

impl ConnectivityError {
    pub fn at(stage: CheckStage) -> impl FnOnce(StorageError) -> Self {
        move |source| Self::Storage { stage, source }
    }
}
