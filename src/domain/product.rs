use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An item on the machine's menu. The machine does not track stock.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Product {
    pub id: u32,
    pub name: String,
    /// Unit price in real currency, kept exactly as written.
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

impl Product {
    pub fn new(id: u32, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id,
            name: name.into(),
            price,
        }
    }
}
