use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("Field [{field}] must not be empty")]
    EmptyField {
        field: &'static str
    },
    #[error("Field [{field}] is {length} characters, the limit is {limit}")]
    FieldTooLong {
        field: &'static str,
        length: usize,
        limit: usize
    },
    #[error("Email [{0}] is not a valid address")]
    InvalidEmail(String),
    #[error("Quantity [{0}] is outside the accepted range 1..=1000")]
    QuantityOutOfRange(i32),
    #[error("Price per unit [{0}] must be positive with at most two decimal places and fit DECIMAL(10, 2)")]
    InvalidPrice(Decimal),
    #[error("Unknown product [{0}]")]
    UnknownProduct(String),
    #[error("Unknown payment method [{0}]")]
    UnknownPaymentMethod(String)
}

impl RecordError {
    pub fn empty(field: &'static str) -> Self {
        Self::EmptyField { field }
    }

    pub fn too_long(field: &'static str, length: usize, limit: usize) -> Self {
        Self::FieldTooLong { field, length, limit }
    }
}
