use crate::domain::product::Product;
use crate::error::{Result, VendingError};
use std::io::Read;

/// Reads `id,name,price` lines of the product menu.
///
/// Prices are real currency and are kept as `Decimal` until a purchase
/// converts them to coin units.
pub struct ProductReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ProductReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn products(self) -> impl Iterator<Item = Result<Product>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(VendingError::from))
    }
}
