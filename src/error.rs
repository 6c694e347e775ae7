use crate::domain::coin::Denomination;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors raised by the coin engine and the layers wrapped around it.
///
/// None of these are fatal: the machine keeps running after any of them.
#[derive(Error, Debug)]
pub enum VendingError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Denomination {0} is not supported")]
    UnsupportedDenomination(Denomination),
    #[error("Overflow: {0}")]
    Overflow(String),
    #[error("Change of {change} is not possible using coins in current inventory")]
    ChangeNotPossible { change: u64 },
    #[error("Payment not accepted: {0}")]
    PaymentNotAccepted(String),
    #[error("Cannot return change of {change} when only {inserted} has been inserted")]
    ChangeExceedsPayment { change: u64, inserted: u64 },
    #[error("Product ({0}) not found in inventory")]
    ProductNotFound(u32),
    #[error("Not enough money for {price}. Please insert {shortfall}")]
    InsufficientFunds { price: Decimal, shortfall: Decimal },
    #[error("{source}")]
    PurchaseRefunded {
        source: Box<VendingError>,
        refunded: Vec<Denomination>,
    },
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, VendingError>;
