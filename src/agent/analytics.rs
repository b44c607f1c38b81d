use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::models::{PaymentMethod, Product, TransactionRecord};

pub const TOP_CUSTOMERS: usize = 10;
pub const TOP_CITIES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceStats {
    pub min: Decimal,
    pub max: Decimal,
    pub avg: Decimal
}

/// Sales analytics over one window of rows. Monetary values are rounded to cents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindowStats {
    pub rows: usize,
    pub sales_per_product: BTreeMap<Product, Decimal>,
    /// Highest average transaction value first.
    pub top_customers: Vec<(String, Decimal)>,
    pub transactions_per_payment_method: BTreeMap<PaymentMethod, u64>,
    /// Highest total sales first.
    pub top_cities: Vec<(String, Decimal)>,
    pub price_per_product: BTreeMap<Product, PriceStats>
}

impl WindowStats {
    pub fn from_records(records: &[TransactionRecord]) -> Self {
        let mut sales_per_product = BTreeMap::new();
        let mut customers: BTreeMap<&str, (Decimal, u64)> = BTreeMap::new();
        let mut transactions_per_payment_method = BTreeMap::new();
        let mut cities: BTreeMap<&str, Decimal> = BTreeMap::new();
        let mut prices: BTreeMap<Product, (Decimal, Decimal, Decimal, u64)> = BTreeMap::new();

        for record in records {
            let total = record.total();
            let price = record.price_per_unit();

            *sales_per_product.entry(record.product()).or_insert(Decimal::ZERO) += total;
            *transactions_per_payment_method.entry(record.payment_method()).or_insert(0) += 1;
            *cities.entry(record.city()).or_insert(Decimal::ZERO) += total;

            let customer = customers.entry(record.customer_name()).or_insert((Decimal::ZERO, 0));
            customer.0 += total;
            customer.1 += 1;

            prices.entry(record.product())
                .and_modify(|(min, max, sum, count)| {
                    *min = (*min).min(price);
                    *max = (*max).max(price);
                    *sum += price;
                    *count += 1;
                })
                .or_insert((price, price, price, 1));
        }

        let top_customers = ranked(
            customers.into_iter().map(|(name, (sum, count))| (name, sum / Decimal::from(count))),
            TOP_CUSTOMERS
        );
        let top_cities = ranked(cities.into_iter(), TOP_CITIES);

        Self {
            rows: records.len(),
            sales_per_product: sales_per_product.into_iter().map(|(product, sales)| (product, sales.round_dp(2))).collect(),
            top_customers,
            transactions_per_payment_method,
            top_cities,
            price_per_product: prices.into_iter()
                .map(|(product, (min, max, sum, count))| (product, PriceStats {
                    min,
                    max,
                    avg: (sum / Decimal::from(count)).round_dp(2)
                }))
                .collect()
        }
    }
}

// Ties keep name order so the prompt is stable for identical windows.
fn ranked<'a>(values: impl Iterator<Item = (&'a str, Decimal)>, limit: usize) -> Vec<(String, Decimal)> {
    let mut values: Vec<_> = values.collect();

    values.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| left.0.cmp(right.0)));
    values.into_iter()
        .take(limit)
        .map(|(name, value)| (name.to_string(), value.round_dp(2)))
        .collect()
}
