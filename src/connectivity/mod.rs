mod errors;
#[cfg(test)]
mod tests;

use std::fmt;
use std::fmt::{Display, Formatter};

use tracing::info;

use crate::generator::{PromoBias, SyntheticGenerator};
use crate::models::TransactionRecord;
use crate::storage::{schema_mismatches, ColumnInfo, TransactionStore};

pub use errors::{CheckStage, ConnectivityError};

pub const PROBE_ROWS: usize = 2;

#[derive(Debug, Clone)]
pub struct ConnectivityReport {
    pub table: String,
    pub columns: Vec<ColumnInfo>,
    pub probe_rows: usize,
    pub total_rows: u64
}

impl Display for ConnectivityReport {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "table: {} (schema ready)", self.table)?;

        for column in &self.columns {
            writeln!(formatter, "  {} {}", column.name, column.data_type)?;
        }

        writeln!(formatter, "probe rows verified: {}", self.probe_rows)?;
        write!(formatter, "rows in table: {}", self.total_rows)
    }
}

/// Synthetic rows used to prove write and read access.
pub fn probe_records(count: usize) -> Result<Vec<TransactionRecord>, ConnectivityError> {
    let mut generator = SyntheticGenerator::from_entropy(PromoBias::none());
    Ok(generator.batch(count)?)
}

/// Ensures the table exists with the expected columns, then writes `probes` and reads them back.
///
/// Probe rows are ordinary records and stay in the table. Pass an empty slice
/// to only check the schema.
pub async fn verify<S: TransactionStore + ?Sized>(store: &S, probes: &[TransactionRecord]) -> Result<ConnectivityReport, ConnectivityError> {
    let table = store.table().to_string();

    store.ensure_schema().await.map_err(ConnectivityError::at(CheckStage::Schema))?;
    let columns = store.describe_columns().await.map_err(ConnectivityError::at(CheckStage::Schema))?;

    //NOTE: CREATE TABLE IF NOT EXISTS leaves a pre-existing table untouched
    let problems = schema_mismatches(&columns);
    if !problems.is_empty() {
        return Err(ConnectivityError::SchemaMismatch { table, problems });
    }

    info!("Table [{table}] is ready with [{}] columns", columns.len());

    if !probes.is_empty() {
        store.insert_batch(probes).await.map_err(ConnectivityError::at(CheckStage::ProbeInsert))?;

        let ids: Vec<_> = probes.iter().map(|record| record.transaction_id()).collect();
        let mut read_back = store.fetch_by_ids(&ids).await.map_err(ConnectivityError::at(CheckStage::ProbeRead))?;
        let mut expected = probes.to_vec();

        read_back.sort_by_key(|record| record.transaction_id());
        expected.sort_by_key(|record| record.transaction_id());

        if read_back != expected {
            return Err(ConnectivityError::ProbeMismatch { expected: expected.len(), found: read_back.len() });
        }

        info!("Wrote and read back [{}] probe rows in [{table}]", probes.len());
    }

    let total_rows = store.count().await.map_err(ConnectivityError::at(CheckStage::RowCount))?;

    Ok(ConnectivityReport {
        table,
        columns,
        probe_rows: probes.len(),
        total_rows
    })
}
