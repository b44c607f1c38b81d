use super::{Checkpoint, PaymentMethod, Product, RecordDraft, TransactionRecord};

use std::str::FromStr;

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::errors::RecordError;

fn timestamp(hour: u32, minute: u32, second: u32) -> Result<NaiveDateTime> {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .and_then(|date| date.and_hms_micro_opt(hour, minute, second, 0))
        .ok_or_else(|| anyhow::anyhow!("invalid test timestamp"))
}

fn create_draft() -> Result<RecordDraft> {
    Ok(RecordDraft {
        transaction_id: Uuid::from_u128(1),
        timestamp: timestamp(12, 0, 0)?,
        customer_name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        product: Product::Laptop,
        quantity: 2,
        price_per_unit: Decimal::from_str("499.99")?,
        payment_method: PaymentMethod::PayPal,
        city: "Springfield".to_string(),
        country: "Freedonia".to_string()
    })
}

#[test]
fn test_valid_draft_becomes_record() -> Result<()> {
    let record = TransactionRecord::try_from(create_draft()?)?;

    assert_eq!(record.transaction_id(), Uuid::from_u128(1));
    assert_eq!(record.product(), Product::Laptop);
    assert_eq!(record.total(), Decimal::from_str("999.98")?);

    Ok(())
}

#[test]
fn test_text_fields_are_trimmed_and_required() -> Result<()> {
    let mut draft = create_draft()?;
    draft.city = "  Paris ".to_string();

    assert_eq!(TransactionRecord::try_from(draft)?.city(), "Paris");

    let mut draft = create_draft()?;
    draft.customer_name = "   ".to_string();

    assert!(matches!(TransactionRecord::try_from(draft), Err(RecordError::EmptyField { field: "customer_name" })));

    Ok(())
}

#[test]
fn test_text_longer_than_column_is_rejected() -> Result<()> {
    let mut draft = create_draft()?;
    draft.country = "x".repeat(256);

    assert!(matches!(TransactionRecord::try_from(draft), Err(RecordError::FieldTooLong { field: "country", length: 256, .. })));

    Ok(())
}

#[test]
fn test_invalid_email_is_rejected() -> Result<()> {
    for email in ["no-at-sign", "@example.com", "jane@"] {
        let mut draft = create_draft()?;
        draft.email = email.to_string();

        assert!(matches!(TransactionRecord::try_from(draft), Err(RecordError::InvalidEmail(_))));
    }

    Ok(())
}

#[test]
fn test_quantity_bounds() -> Result<()> {
    for quantity in [0, -1, 1001] {
        let mut draft = create_draft()?;
        draft.quantity = quantity;

        assert!(matches!(TransactionRecord::try_from(draft), Err(RecordError::QuantityOutOfRange(_))));
    }

    Ok(())
}

#[test]
fn test_price_must_fit_decimal_10_2() -> Result<()> {
    for price in ["0", "-1.00", "10.001", "100000000.00"] {
        let mut draft = create_draft()?;
        draft.price_per_unit = Decimal::from_str(price)?;

        assert!(matches!(TransactionRecord::try_from(draft), Err(RecordError::InvalidPrice(_))));
    }

    let mut draft = create_draft()?;
    draft.price_per_unit = Decimal::from_str("10.500")?;

    assert!(TransactionRecord::try_from(draft).is_ok());

    Ok(())
}

#[test]
fn test_timestamp_is_truncated_to_microseconds() -> Result<()> {
    let mut draft = create_draft()?;
    draft.timestamp = timestamp(12, 0, 0)?.with_nanosecond(123_456_789).ok_or_else(|| anyhow::anyhow!("nanos"))?;

    let record = TransactionRecord::try_from(draft)?;

    assert_eq!(record.timestamp().nanosecond(), 123_456_000);

    Ok(())
}

#[test]
fn test_enum_text_round_trips_database_spelling() -> Result<()> {
    assert_eq!(PaymentMethod::from_str("Credit Card")?, PaymentMethod::CreditCard);
    assert_eq!(PaymentMethod::from_str("gift card")?, PaymentMethod::GiftCard);
    assert_eq!(Product::from_str("phone")?, Product::Phone);
    assert!(Product::from_str("Toaster").is_err());
    assert!(PaymentMethod::from_str("Cash").is_err());

    Ok(())
}

#[test]
fn test_checkpoint_orders_by_timestamp_then_identifier() -> Result<()> {
    let earlier = Checkpoint::new(timestamp(12, 0, 0)?, Uuid::from_u128(9));
    let same_time_higher_id = Checkpoint::new(timestamp(12, 0, 0)?, Uuid::from_u128(10));
    let later = Checkpoint::new(timestamp(12, 0, 1)?, Uuid::from_u128(1));

    assert!(earlier < same_time_higher_id);
    assert!(same_time_higher_id < later);

    Ok(())
}

#[test]
fn test_record_serializes_enum_display_names() -> Result<()> {
    let mut draft = create_draft()?;
    draft.payment_method = PaymentMethod::CreditCard;
    let json = serde_json::to_value(TransactionRecord::try_from(draft)?)?;

    assert_eq!(json["payment_method"], "Credit Card");
    assert_eq!(json["product"], "Laptop");
    assert_eq!(json["price_per_unit"], "499.99");

    Ok(())
}
