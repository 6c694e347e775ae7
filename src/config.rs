use crate::domain::coin::Denomination;
use crate::domain::converter::{DenominationConverter, MAX_SCALE};
use crate::error::{Result, VendingError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

pub const DEFAULT_SCALE: u32 = 2;
pub const DEFAULT_DENOMINATIONS: [u32; 8] = [1, 2, 5, 10, 20, 50, 100, 200];

/// Which coins the machine accepts and how they map to real currency.
///
/// ```json
/// { "scale": 2, "denominations": [1, 2, 5, 10, 20, 50, 100, 200] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoinSettings {
    /// Decimal places between a denomination unit and a currency unit.
    pub scale: u32,
    pub denominations: Vec<Denomination>,
}

impl Default for CoinSettings {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            denominations: DEFAULT_DENOMINATIONS
                .iter()
                .filter_map(|v| Denomination::new(i64::from(*v)).ok())
                .collect(),
        }
    }
}

impl CoinSettings {
    /// Reads and validates settings from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.scale > MAX_SCALE {
            return Err(VendingError::Config(format!(
                "scale must be at most {MAX_SCALE}, got {}",
                self.scale
            )));
        }
        if self.denominations.is_empty() {
            return Err(VendingError::Config(
                "at least one denomination is required".to_string(),
            ));
        }
        let mut seen = BTreeSet::new();
        for denomination in &self.denominations {
            if !seen.insert(denomination) {
                return Err(VendingError::Config(format!(
                    "denomination {denomination} is listed more than once"
                )));
            }
        }
        Ok(())
    }

    pub fn converter(&self) -> Result<DenominationConverter> {
        DenominationConverter::new(self.scale)
    }
}
