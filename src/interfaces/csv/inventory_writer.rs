use crate::domain::coin::{Denomination, Inventory};
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct InventoryRow {
    denomination: Denomination,
    count: u32,
}

/// Writes a coin inventory as `denomination,count` CSV with a header row.
pub struct InventoryWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> InventoryWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_inventory(&mut self, inventory: &Inventory) -> Result<()> {
        for (denomination, count) in inventory.iter() {
            self.writer.serialize(InventoryRow {
                denomination,
                count,
            })?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
