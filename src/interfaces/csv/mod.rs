//! CSV loaders for the coin and product files, and the inventory report.

pub mod coin_reader;
pub mod inventory_writer;
pub mod product_reader;
