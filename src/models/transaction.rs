use chrono::{NaiveDateTime, SubsecRound};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::errors::RecordError;
use crate::models::{Checkpoint, PaymentMethod, Product};
use crate::types::TransactionId;

const MAX_TEXT_LENGTH: usize = 255;
const MAX_QUANTITY: i32 = 1000;
const PRICE_SCALE: u32 = 2;

/// Unvalidated field values for a transaction record.
///
/// Drafts come from the synthetic generator or from database rows and only
/// become a [`TransactionRecord`] through `TryFrom`.
#[derive(Debug, Clone)]
pub struct RecordDraft {
    pub transaction_id: TransactionId,
    pub timestamp: NaiveDateTime,
    pub customer_name: String,
    pub email: String,
    pub product: Product,
    pub quantity: i32,
    pub price_per_unit: Decimal,
    pub payment_method: PaymentMethod,
    pub city: String,
    pub country: String
}

/// A single synthetic sale, as stored in the transactions table.
///
/// Every instance has passed validation: text fields are non-empty and fit
/// `VARCHAR(255)`, the quantity is in range and the price fits `DECIMAL(10, 2)`.
/// Timestamps are truncated to microseconds, the storage granularity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    transaction_id: TransactionId,
    timestamp: NaiveDateTime,
    customer_name: String,
    email: String,
    product: Product,
    quantity: i32,
    price_per_unit: Decimal,
    payment_method: PaymentMethod,
    city: String,
    country: String
}

impl TransactionRecord {
    pub fn transaction_id(&self) -> TransactionId {
        self.transaction_id
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }

    pub fn customer_name(&self) -> &str {
        &self.customer_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn product(&self) -> Product {
        self.product
    }

    pub fn quantity(&self) -> i32 {
        self.quantity
    }

    pub fn price_per_unit(&self) -> Decimal {
        self.price_per_unit
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    /// Sale value: quantity times unit price.
    pub fn total(&self) -> Decimal {
        Decimal::from(self.quantity) * self.price_per_unit
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint::new(self.timestamp, self.transaction_id)
    }

    fn validate_text(field: &'static str, value: String) -> Result<String, RecordError> {
        let value = value.trim().to_string();

        if value.is_empty() {
            return Err(RecordError::empty(field));
        }

        let length = value.chars().count();

        if length > MAX_TEXT_LENGTH {
            return Err(RecordError::too_long(field, length, MAX_TEXT_LENGTH));
        }

        Ok(value)
    }

    fn validate_price(price: Decimal) -> Result<Decimal, RecordError> {
        let upper_bound = Decimal::new(100_000_000, 0);

        if price <= Decimal::ZERO || price >= upper_bound || price.normalize().scale() > PRICE_SCALE {
            return Err(RecordError::InvalidPrice(price));
        }

        Ok(price)
    }
}

impl TryFrom<RecordDraft> for TransactionRecord {
    type Error = RecordError;

    fn try_from(draft: RecordDraft) -> Result<Self, Self::Error> {
        let email = Self::validate_text("email", draft.email)?;

        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {},
            _ => return Err(RecordError::InvalidEmail(email))
        }

        if !(1..=MAX_QUANTITY).contains(&draft.quantity) {
            return Err(RecordError::QuantityOutOfRange(draft.quantity));
        }

        Ok(Self {
            transaction_id: draft.transaction_id,
            timestamp: draft.timestamp.trunc_subsecs(6),
            customer_name: Self::validate_text("customer_name", draft.customer_name)?,
            email,
            product: draft.product,
            quantity: draft.quantity,
            price_per_unit: Self::validate_price(draft.price_per_unit)?,
            payment_method: draft.payment_method,
            city: Self::validate_text("city", draft.city)?,
            country: Self::validate_text("country", draft.country)?
        })
    }
}
