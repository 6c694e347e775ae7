use crate::error::{Result, VendingError};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

/// Largest scale supported, so that `10^scale` fits comfortably in a `Decimal`.
pub const MAX_SCALE: u32 = 18;

/// Converts between real currency amounts and integer denomination units
/// using a fixed number of decimal places (scale 2: `0.20` <-> `20`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DenominationConverter {
    scale: u32,
}

impl DenominationConverter {
    pub fn new(scale: u32) -> Result<Self> {
        if scale > MAX_SCALE {
            return Err(VendingError::InvalidArgument(format!(
                "Scale must be at most {MAX_SCALE}, got {scale}"
            )));
        }
        Ok(Self { scale })
    }

    pub fn scale(&self) -> u32 {
        self.scale
    }

    /// Scales `value` to integer units, rounding half to even.
    pub fn to_denomination(&self, value: Decimal) -> Result<i64> {
        let overflow = || VendingError::Overflow(format!("{value} cannot be expressed in units"));
        let factor = Decimal::from(10_i64.pow(self.scale));
        value
            .checked_mul(factor)
            .map(|units| units.round())
            .and_then(|units| units.to_i64())
            .ok_or_else(overflow)
    }

    pub fn to_decimal(&self, units: i64) -> Decimal {
        Decimal::new(units, self.scale)
    }
}
