//! Bounded coin change.
//!
//! Each denomination has a finite supply, so the textbook unbounded recurrence
//! and the greedy largest-coin-first rule both give wrong answers here. The
//! solver instead builds a reachability table over every sub-amount up to the
//! target, one denomination at a time from largest to smallest:
//!
//! * a single denomination reaches every multiple of itself up to its supply;
//! * each further denomination reaches everything already reachable, plus any
//!   sub-amount that `k` of its coins close onto a previously reachable
//!   remainder, for the smallest such `k` within supply.
//!
//! A sub-amount keeps the first step that reached it. The plan returned is an
//! exact combination within supply that leans towards few coins, but it is not
//! guaranteed to be the global minimum when several combinations compete.

use super::coin::{ChangePlan, Denomination, Inventory};
use super::ports::ChangeSolver;
use crate::error::{Result, VendingError};

/// Upper bound on reach table slots, in multiples of the coins' common divisor.
pub const MAX_TABLE_LEN: usize = 1 << 24;

/// Dynamic-programming solver for change with limited coin supply.
///
/// Runs in `O(denominations * amount * coins per step)` time and
/// `O(amount)` space, never enumerating subsets. Amounts above the usable
/// supply are rejected before any table is built.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoundedChangeSolver;

impl BoundedChangeSolver {
    pub fn new() -> Self {
        Self
    }
}

impl ChangeSolver for BoundedChangeSolver {
    fn calculate(&self, inventory: &Inventory, amount: i64) -> Result<Option<ChangePlan>> {
        if amount < 0 {
            return Err(VendingError::InvalidArgument(format!(
                "Change must not be negative, got {amount}"
            )));
        }
        if amount == 0 {
            return Ok(Some(ChangePlan::new()));
        }
        let requested = amount.unsigned_abs();

        // Coins larger than the change can never be part of an exact match.
        let coins: Vec<(Denomination, u32)> = inventory
            .iter()
            .rev()
            .filter(|(denomination, count)| {
                *count > 0 && u64::from(denomination.value()) <= requested
            })
            .collect();

        let supply: u128 = coins
            .iter()
            .map(|(denomination, count)| u128::from(denomination.value()) * u128::from(*count))
            .sum();
        if supply < u128::from(requested) {
            return Ok(None);
        }

        // Every reachable amount is a multiple of the coins' common divisor,
        // so the table only needs one slot per multiple.
        let unit = coins
            .iter()
            .fold(0, |unit, (denomination, _)| gcd(unit, denomination.value()));
        if unit == 0 || requested % u64::from(unit) != 0 {
            return Ok(None);
        }
        let target = usize::try_from(requested / u64::from(unit))
            .map_err(|_| VendingError::Overflow(format!("Change of {amount} is too large")))?;

        if target >= MAX_TABLE_LEN {
            return Err(VendingError::Overflow(format!(
                "Change of {amount} is too large to solve"
            )));
        }

        Ok(ReachTable::build(&coins, unit, target)?
            .map(|table| table.into_plan(&coins, unit, target)))
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[derive(Debug, Clone, Copy)]
struct Step {
    /// Index into the largest-first coin list.
    coin: usize,
    count: u32,
}

/// `steps[j]` holds the step that first made sub-amount `j` reachable.
/// Zero is reachable without a step.
struct ReachTable {
    steps: Vec<Option<Step>>,
}

impl ReachTable {
    /// Returns `None` if `target` never becomes reachable. Sub-amounts are
    /// counted in multiples of `unit`.
    fn build(coins: &[(Denomination, u32)], unit: u32, target: usize) -> Result<Option<Self>> {
        let Some(&(smallest, _)) = coins.last() else {
            return Ok(None);
        };
        let smallest = (smallest.value() / unit) as usize;

        let mut steps = Vec::new();
        steps.try_reserve_exact(target + 1).map_err(|_| {
            VendingError::Overflow(format!("No room to solve change of {target} x {unit}"))
        })?;
        steps.resize(target + 1, None);
        let mut table = Self { steps };

        for (index, &(denomination, available)) in coins.iter().enumerate() {
            let value = (denomination.value() / unit) as usize;
            let available = u64::from(available);

            for sub_amount in (smallest..=target).rev() {
                if table.is_reachable(sub_amount) {
                    continue;
                }

                let mut count: u64 = 1;
                let mut used = value;
                while count <= available && used <= sub_amount {
                    if table.is_reachable(sub_amount - used) {
                        // count <= available, which is a u32
                        table.steps[sub_amount] = Some(Step {
                            coin: index,
                            count: count as u32,
                        });
                        if sub_amount == target {
                            return Ok(Some(table));
                        }
                        break;
                    }
                    count += 1;
                    used += value;
                }
            }
        }
        Ok(None)
    }

    fn is_reachable(&self, sub_amount: usize) -> bool {
        sub_amount == 0 || self.steps[sub_amount].is_some()
    }

    /// Walks from the smallest denomination up to the largest, peeling off
    /// each step's contribution. Every step's remainder was reached by an
    /// earlier (larger) denomination, so one pass is enough.
    fn into_plan(self, coins: &[(Denomination, u32)], unit: u32, target: usize) -> ChangePlan {
        let mut plan = ChangePlan::new();
        let mut remaining = target;
        for (index, &(denomination, _)) in coins.iter().enumerate().rev() {
            if let Some(step) = self.steps[remaining]
                && step.coin == index
            {
                plan.add(denomination, step.count);
                remaining -= (denomination.value() / unit) as usize * step.count as usize;
            }
        }
        debug_assert_eq!(remaining, 0, "reach table did not close on zero");
        plan
    }
}
