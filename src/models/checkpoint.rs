use chrono::NaiveDateTime;
use serde::Serialize;

use crate::types::TransactionId;

/// Position of the newest row a reader has seen.
///
/// Rows sharing a timestamp are ordered by identifier, so `(timestamp, id)`
/// is a strict total order over the table and no row is read twice.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub struct Checkpoint {
    pub timestamp: NaiveDateTime,
    pub transaction_id: TransactionId
}

impl Checkpoint {
    pub fn new(timestamp: NaiveDateTime, transaction_id: TransactionId) -> Self {
        Self { timestamp, transaction_id }
    }
}
