mod checkpoint;
mod errors;
#[cfg(test)]
mod tests;
mod transaction;

use std::fmt;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::Serialize;

pub use checkpoint::Checkpoint;
pub use errors::RecordError;
pub use transaction::{RecordDraft, TransactionRecord};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub enum Product {
    Shoes,
    Shirt,
    Phone,
    Laptop,
    Book
}

impl Product {
    pub const ALL: [Product; 5] = [Product::Shoes, Product::Shirt, Product::Phone, Product::Laptop, Product::Book];

    pub fn as_str(&self) -> &'static str {
        match self {
            Product::Shoes => "Shoes",
            Product::Shirt => "Shirt",
            Product::Phone => "Phone",
            Product::Laptop => "Laptop",
            Product::Book => "Book"
        }
    }
}

impl Display for Product {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Product {
    type Err = RecordError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Product::ALL.into_iter()
            .find(|product| product.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| RecordError::UnknownProduct(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize)]
pub enum PaymentMethod {
    #[serde(rename = "Credit Card")]
    CreditCard,
    PayPal,
    Crypto,
    #[serde(rename = "Gift Card")]
    GiftCard
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [PaymentMethod::CreditCard, PaymentMethod::PayPal, PaymentMethod::Crypto, PaymentMethod::GiftCard];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "Credit Card",
            PaymentMethod::PayPal => "PayPal",
            PaymentMethod::Crypto => "Crypto",
            PaymentMethod::GiftCard => "Gift Card"
        }
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = RecordError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL.into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| RecordError::UnknownPaymentMethod(value.to_string()))
    }
}
