use crate::error::{Result, VendingError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Face value of a coin in the machine's smallest indivisible unit.
///
/// Always strictly positive. Conversion to and from real currency lives in
/// [`crate::domain::converter`]; everything here is integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Denomination(u32);

impl Denomination {
    pub fn new(value: i64) -> Result<Self> {
        if value <= 0 {
            return Err(VendingError::InvalidArgument(format!(
                "Denomination must be positive, got {value}"
            )));
        }
        u32::try_from(value).map(Self).map_err(|_| {
            VendingError::InvalidArgument(format!("Denomination {value} is out of range"))
        })
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl TryFrom<i64> for Denomination {
    type Error = VendingError;

    fn try_from(value: i64) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Denomination> for u32 {
    fn from(denomination: Denomination) -> Self {
        denomination.0
    }
}

impl fmt::Display for Denomination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coins owned by the machine and available to be dispensed as change.
///
/// Keys are unique and ordered by face value. Only the ledger mutates an
/// inventory; solvers receive it by shared reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Inventory {
    coins: BTreeMap<Denomination, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count held for `denomination`, `None` if it is not a slot of this inventory.
    pub fn get(&self, denomination: Denomination) -> Option<u32> {
        self.coins.get(&denomination).copied()
    }

    pub fn contains(&self, denomination: Denomination) -> bool {
        self.coins.contains_key(&denomination)
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    /// Iterates slots in ascending denomination order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Denomination, u32)> + '_ {
        self.coins.iter().map(|(d, c)| (*d, *c))
    }

    pub fn denominations(&self) -> impl DoubleEndedIterator<Item = Denomination> + '_ {
        self.coins.keys().copied()
    }

    /// Total face value of every coin held.
    pub fn total_value(&self) -> u128 {
        self.coins
            .iter()
            .map(|(d, c)| u128::from(d.value()) * u128::from(*c))
            .sum()
    }

    pub(crate) fn get_mut(&mut self, denomination: Denomination) -> Option<&mut u32> {
        self.coins.get_mut(&denomination)
    }
}

impl FromIterator<(Denomination, u32)> for Inventory {
    fn from_iter<I: IntoIterator<Item = (Denomination, u32)>>(iter: I) -> Self {
        Self {
            coins: iter.into_iter().collect(),
        }
    }
}

/// Coins to remove from an [`Inventory`] to pay out an exact amount.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangePlan {
    coins: BTreeMap<Denomination, u32>,
}

impl ChangePlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `count` coins of `denomination` to the plan. Zero counts are not recorded.
    pub fn add(&mut self, denomination: Denomination, count: u32) {
        if count > 0 {
            *self.coins.entry(denomination).or_insert(0) += count;
        }
    }

    pub fn get(&self, denomination: Denomination) -> u32 {
        self.coins.get(&denomination).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = (Denomination, u32)> + '_ {
        self.coins.iter().map(|(d, c)| (*d, *c))
    }

    /// Sum of `denomination * count` over the plan.
    pub fn total(&self) -> u64 {
        self.coins
            .iter()
            .map(|(d, c)| u64::from(d.value()) * u64::from(*c))
            .sum()
    }

    /// Number of physical coins the plan pays out.
    pub fn coin_count(&self) -> u64 {
        self.coins.values().map(|c| u64::from(*c)).sum()
    }
}

impl FromIterator<(Denomination, u32)> for ChangePlan {
    fn from_iter<I: IntoIterator<Item = (Denomination, u32)>>(iter: I) -> Self {
        let mut plan = Self::new();
        for (denomination, count) in iter {
            plan.add(denomination, count);
        }
        plan
    }
}
