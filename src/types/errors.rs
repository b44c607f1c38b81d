use std::num::{ParseFloatError, ParseIntError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("Rate error: {0}")]
    InvalidRate(String),
    #[error("Rate error: {0}")]
    ParseFloat(#[from] ParseFloatError),
    #[error("Batch size error: {0}")]
    InvalidBatchSize(String),
    #[error("Batch size error: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("Identifier error: [{value}] {reason}")]
    InvalidIdentifier {
        value: String,
        reason: &'static str
    }
}

impl ValueError {
    pub fn identifier(value: &str, reason: &'static str) -> Self {
        Self::InvalidIdentifier { value: value.to_string(), reason }
    }
}
