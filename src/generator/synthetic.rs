use chrono::{NaiveDateTime, Utc};
use fake::faker::address::en::{CityName, CountryName};
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use uuid::Builder;

use crate::models::{PaymentMethod, Product, RecordDraft, RecordError, TransactionRecord};

pub const DEFAULT_PROMO_WEIGHT: u32 = 5;
const MIN_PRICE_CENTS: i64 = 10_00;
const MAX_PRICE_CENTS: i64 = 500_00;
const MAX_QUANTITY: i32 = 5;

/// Products that are drawn more often than the rest.
#[derive(Debug, Clone, PartialEq)]
pub struct PromoBias {
    promoted: Vec<Product>,
    weight: u32
}

impl PromoBias {
    pub fn new(promoted: Vec<Product>, weight: u32) -> Self {
        Self {
            promoted,
            weight: weight.max(1)
        }
    }

    /// Every product equally likely.
    pub fn none() -> Self {
        Self::new(Vec::new(), 1)
    }

    pub fn weight_of(&self, product: Product) -> u32 {
        if self.promoted.contains(&product) { self.weight } else { 1 }
    }
}

impl Default for PromoBias {
    fn default() -> Self {
        Self::new(vec![Product::Phone, Product::Laptop], DEFAULT_PROMO_WEIGHT)
    }
}

/// Produces plausible, validated sales records.
///
/// Timestamps never go backwards across calls, even if the wall clock does.
pub struct SyntheticGenerator<R: Rng = StdRng> {
    rng: R,
    promo: PromoBias,
    last_timestamp: Option<NaiveDateTime>
}

impl SyntheticGenerator<StdRng> {
    pub fn from_entropy(promo: PromoBias) -> Self {
        Self::new(StdRng::from_entropy(), promo)
    }

    /// Same seed, same sequence of everything but timestamps.
    pub fn seeded(seed: u64, promo: PromoBias) -> Self {
        Self::new(StdRng::seed_from_u64(seed), promo)
    }
}

impl<R: Rng> SyntheticGenerator<R> {
    pub fn new(rng: R, promo: PromoBias) -> Self {
        Self {
            rng,
            promo,
            last_timestamp: None
        }
    }

    pub fn next_record(&mut self) -> Result<TransactionRecord, RecordError> {
        let mut id_bytes = [0u8; 16];
        self.rng.fill(&mut id_bytes);

        let product = self.pick_product();
        let price_cents = self.rng.gen_range(MIN_PRICE_CENTS..=MAX_PRICE_CENTS);
        let payment_method = *PaymentMethod::ALL.choose(&mut self.rng).unwrap_or(&PaymentMethod::CreditCard);

        let record = TransactionRecord::try_from(RecordDraft {
            transaction_id: Builder::from_random_bytes(id_bytes).into_uuid(),
            timestamp: self.next_timestamp(),
            customer_name: Name().fake_with_rng(&mut self.rng),
            email: SafeEmail().fake_with_rng(&mut self.rng),
            product,
            quantity: self.rng.gen_range(1..=MAX_QUANTITY),
            price_per_unit: Decimal::new(price_cents, 2),
            payment_method,
            city: CityName().fake_with_rng(&mut self.rng),
            country: CountryName().fake_with_rng(&mut self.rng)
        })?;

        self.last_timestamp = Some(record.timestamp());

        Ok(record)
    }

    pub fn batch(&mut self, size: usize) -> Result<Vec<TransactionRecord>, RecordError> {
        (0..size).map(|_| self.next_record()).collect()
    }

    fn next_timestamp(&self) -> NaiveDateTime {
        let now = Utc::now().naive_utc();

        match self.last_timestamp {
            Some(last) if last > now => last,
            _ => now
        }
    }

    fn pick_product(&mut self) -> Product {
        let total: u32 = Product::ALL.iter().map(|product| self.promo.weight_of(*product)).sum();
        let mut roll = self.rng.gen_range(0..total);

        for product in Product::ALL {
            let weight = self.promo.weight_of(product);

            if roll < weight {
                return product;
            }

            roll -= weight;
        }

        Product::ALL[Product::ALL.len() - 1]
    }
}
