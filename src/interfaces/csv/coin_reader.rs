use crate::domain::coin::Denomination;
use crate::error::{Result, VendingError};
use serde::Deserialize;
use std::io::Read;

/// One `denomination,count` line of a coin load file.
#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
pub struct CoinStock {
    pub denomination: Denomination,
    pub count: i64,
}

/// Reads the coins to preload into the machine from a header-less CSV source.
pub struct CoinReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> CoinReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes each line. A bad line yields an error and reading continues.
    pub fn coins(self) -> impl Iterator<Item = Result<CoinStock>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(VendingError::from))
    }
}
