//! Coin engine and the types it works on.
//!
//! Nothing in here performs I/O. Amounts are integer units of the smallest
//! coin; see [`converter`] for the mapping to real currency.

pub mod change;
pub mod coin;
pub mod converter;
pub mod ledger;
pub mod ports;
pub mod product;
