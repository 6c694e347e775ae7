use super::coin::{ChangePlan, Denomination, Inventory};
use super::ports::ChangeSolverBox;
use crate::error::{Result, VendingError};
use std::collections::BTreeSet;
use tracing::{debug, error, info};

/// Tracks the machine's coin inventory and the coins the current customer
/// has inserted but not yet paid with.
///
/// Invariants, before and after every public call:
/// - every accepted denomination has an inventory slot, and no other does;
/// - every pending coin is an accepted denomination;
/// - the inventory is only changed by [`load_coins`](Self::load_coins) and by a
///   successful [`try_accept_payment_and_dispense_change`](Self::try_accept_payment_and_dispense_change).
pub struct CoinLedger {
    solver: ChangeSolverBox,
    accepted: BTreeSet<Denomination>,
    inventory: Inventory,
    pending: Vec<Denomination>,
}

impl CoinLedger {
    /// Creates a ledger accepting exactly `denominations`, with an empty inventory.
    pub fn new(solver: ChangeSolverBox, denominations: &[Denomination]) -> Self {
        let mut ledger = Self {
            solver,
            accepted: BTreeSet::new(),
            inventory: Inventory::new(),
            pending: Vec::new(),
        };
        ledger.initialize(denominations);
        ledger
    }

    /// Sets the accepted denominations. All stored and inserted coins are dropped.
    pub fn initialize(&mut self, denominations: &[Denomination]) {
        self.accepted = denominations.iter().copied().collect();
        self.inventory = self.accepted.iter().map(|d| (*d, 0)).collect();
        self.pending.clear();
    }

    pub fn accepted_denominations(&self) -> impl DoubleEndedIterator<Item = Denomination> + '_ {
        self.accepted.iter().copied()
    }

    pub fn is_accepted(&self, denomination: Denomination) -> bool {
        self.accepted.contains(&denomination)
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    /// Coins inserted by the current customer, in insertion order.
    pub fn pending(&self) -> &[Denomination] {
        &self.pending
    }

    /// Sum of the coins inserted so far. Recomputed on every call.
    pub fn total_inserted(&self) -> u64 {
        self.pending.iter().map(|d| u64::from(d.value())).sum()
    }

    /// Queues a single coin until the payment is accepted or refunded.
    pub fn insert_coin(&mut self, denomination: Denomination) -> Result<()> {
        self.ensure_accepted(denomination)?;
        self.pending.push(denomination);
        debug!(%denomination, inserted = self.total_inserted(), "Coin inserted");
        Ok(())
    }

    /// Bulk loads coins into the inventory.
    ///
    /// On overflow the inventory is left unchanged.
    pub fn load_coins(&mut self, denomination: Denomination, count: i64) -> Result<()> {
        self.ensure_accepted(denomination)?;
        if count < 0 {
            return Err(VendingError::InvalidArgument(format!(
                "Coin count must not be negative, got {count}"
            )));
        }

        let slot = self
            .inventory
            .get_mut(denomination)
            .ok_or(VendingError::UnsupportedDenomination(denomination))?;
        let loaded = u32::try_from(count)
            .ok()
            .and_then(|count| slot.checked_add(count))
            .ok_or_else(|| {
                VendingError::Overflow(format!(
                    "Coin slot for denomination {denomination} cannot hold {count} more coins"
                ))
            })?;
        *slot = loaded;
        Ok(())
    }

    /// Returns every inserted coin to the customer. The inventory is untouched.
    pub fn refund(&mut self) -> Vec<Denomination> {
        let refunded = std::mem::take(&mut self.pending);
        for coin in refunded.iter().rev() {
            info!(denomination = %coin, "Dispensing 1 coin");
        }
        refunded
    }

    /// Takes the inserted coins as payment and pays out `change` from the
    /// inventory, or does nothing at all.
    ///
    /// Change is solved against the inventory as it was before this payment,
    /// so the customer's own coins are never handed back as their change.
    pub fn try_accept_payment_and_dispense_change(&mut self, change: i64) -> Result<ChangePlan> {
        if change < 0 {
            return Err(VendingError::InvalidArgument(format!(
                "Change must not be negative, got {change}"
            )));
        }
        let requested = change.unsigned_abs();
        let inserted = self.total_inserted();
        if requested > inserted {
            error!(change, inserted, "Cannot return change that is more than the payment amount");
            return Err(VendingError::ChangeExceedsPayment {
                change: requested,
                inserted,
            });
        }

        let Some(plan) = self.solver.calculate(&self.inventory, change)? else {
            error!(change, "Change required is not possible using coins in current inventory");
            return Err(VendingError::ChangeNotPossible { change: requested });
        };

        let mut staged = self.accept_payment()?;
        Self::dispense_change(&mut staged, &plan)?;

        self.inventory = staged;
        self.pending.clear();
        for (denomination, count) in plan.iter() {
            info!(%denomination, count, "Dispensing change");
        }
        debug!(inventory = ?self.inventory, "Coin inventory after payment");
        Ok(plan)
    }

    /// Copy of the inventory with every pending coin folded in.
    fn accept_payment(&self) -> Result<Inventory> {
        let mut staged = self.inventory.clone();
        for coin in &self.pending {
            let slot = staged
                .get_mut(*coin)
                .ok_or(VendingError::UnsupportedDenomination(*coin))?;
            *slot = slot.checked_add(1).ok_or_else(|| {
                error!(denomination = %coin, "Coin slot is full");
                VendingError::PaymentNotAccepted(format!(
                    "Coin slot for denomination {coin} is full"
                ))
            })?;
        }
        Ok(staged)
    }

    /// Removes the plan's coins from `staged`.
    ///
    /// A plan solved against the pre-payment inventory always fits; a shortfall
    /// here means the solver broke its contract.
    fn dispense_change(staged: &mut Inventory, plan: &ChangePlan) -> Result<()> {
        for (denomination, count) in plan.iter() {
            let slot = staged.get_mut(denomination).ok_or_else(|| {
                error!(%denomination, "Change plan uses an unsupported denomination");
                VendingError::PaymentNotAccepted(format!(
                    "Change plan uses unsupported denomination {denomination}"
                ))
            })?;
            let available = *slot;
            *slot = available.checked_sub(count).ok_or_else(|| {
                error!(
                    %denomination,
                    available,
                    needed = count,
                    "Not enough coins for change plan"
                );
                VendingError::PaymentNotAccepted(format!(
                    "Not enough coins of denomination {denomination}: {available} available, {count} needed"
                ))
            })?;
        }
        Ok(())
    }

    fn ensure_accepted(&self, denomination: Denomination) -> Result<()> {
        if self.is_accepted(denomination) {
            Ok(())
        } else {
            Err(VendingError::UnsupportedDenomination(denomination))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::change::BoundedChangeSolver;
    use crate::domain::ports::ChangeSolver;

    fn d(value: i64) -> Denomination {
        Denomination::new(value).unwrap()
    }

    fn ledger(denominations: &[i64]) -> CoinLedger {
        let denominations: Vec<Denomination> = denominations.iter().map(|v| d(*v)).collect();
        CoinLedger::new(Box::new(BoundedChangeSolver::new()), &denominations)
    }

    /// Always answers with the same plan, regardless of inventory.
    struct ScriptedSolver(Option<ChangePlan>);

    impl ChangeSolver for ScriptedSolver {
        fn calculate(&self, _inventory: &Inventory, _amount: i64) -> Result<Option<ChangePlan>> {
            Ok(self.0.clone())
        }
    }

    fn scripted(denominations: &[i64], answer: Option<ChangePlan>) -> CoinLedger {
        let denominations: Vec<Denomination> = denominations.iter().map(|v| d(*v)).collect();
        CoinLedger::new(Box::new(ScriptedSolver(answer)), &denominations)
    }

    fn snapshot(ledger: &CoinLedger) -> (Inventory, Vec<Denomination>) {
        (ledger.inventory().clone(), ledger.pending().to_vec())
    }

    #[test]
    fn test_initialize_creates_empty_slots() {
        let ledger = ledger(&[5, 10, 15]);
        let slots: Vec<(Denomination, u32)> = ledger.inventory().iter().collect();
        assert_eq!(slots, vec![(d(5), 0), (d(10), 0), (d(15), 0)]);
        assert_eq!(ledger.total_inserted(), 0);
    }

    #[test]
    fn test_initialize_resets_state() {
        let mut ledger = ledger(&[5, 10]);
        ledger.load_coins(d(5), 3).unwrap();
        ledger.insert_coin(d(10)).unwrap();

        ledger.initialize(&[d(20)]);
        assert_eq!(ledger.inventory().iter().collect::<Vec<_>>(), vec![(d(20), 0)]);
        assert!(ledger.pending().is_empty());
        assert!(matches!(
            ledger.insert_coin(d(5)),
            Err(VendingError::UnsupportedDenomination(_))
        ));
    }

    #[test]
    fn test_insert_single_coin() {
        let mut ledger = ledger(&[15]);
        ledger.insert_coin(d(15)).unwrap();
        assert_eq!(ledger.total_inserted(), 15);
        assert_eq!(ledger.inventory().get(d(15)), Some(0));
    }

    #[test]
    fn test_insert_multiple_coins() {
        let mut ledger = ledger(&[5, 15]);
        ledger.insert_coin(d(15)).unwrap();
        assert_eq!(ledger.total_inserted(), 15);
        ledger.insert_coin(d(5)).unwrap();
        assert_eq!(ledger.total_inserted(), 20);
    }

    #[test]
    fn test_insert_unsupported_denomination() {
        let mut ledger = ledger(&[15]);
        ledger.insert_coin(d(15)).unwrap();
        let result = ledger.insert_coin(d(5));
        assert!(matches!(
            result,
            Err(VendingError::UnsupportedDenomination(x)) if x == d(5)
        ));
        assert_eq!(ledger.pending(), &[d(15)]);
    }

    #[test]
    fn test_load_unsupported_denomination() {
        let mut ledger = ledger(&[15]);
        assert!(matches!(
            ledger.load_coins(d(5), 10),
            Err(VendingError::UnsupportedDenomination(_))
        ));
    }

    #[test]
    fn test_load_negative_count() {
        let mut ledger = ledger(&[15]);
        assert!(matches!(
            ledger.load_coins(d(15), -1),
            Err(VendingError::InvalidArgument(_))
        ));
        assert_eq!(ledger.inventory().get(d(15)), Some(0));
    }

    #[test]
    fn test_load_coins_accumulates() {
        let mut ledger = ledger(&[15]);
        ledger.load_coins(d(15), 2).unwrap();
        ledger.load_coins(d(15), 0).unwrap();
        ledger.load_coins(d(15), 3).unwrap();
        assert_eq!(ledger.inventory().get(d(15)), Some(5));
    }

    #[test]
    fn test_load_overflow_leaves_inventory_unchanged() {
        let mut ledger = ledger(&[15]);
        ledger.load_coins(d(15), i64::from(u32::MAX) - 1).unwrap();
        assert!(matches!(
            ledger.load_coins(d(15), 2),
            Err(VendingError::Overflow(_))
        ));
        assert!(matches!(
            ledger.load_coins(d(15), i64::MAX),
            Err(VendingError::Overflow(_))
        ));
        assert_eq!(ledger.inventory().get(d(15)), Some(u32::MAX - 1));

        ledger.load_coins(d(15), 1).unwrap();
        assert_eq!(ledger.inventory().get(d(15)), Some(u32::MAX));
    }

    #[test]
    fn test_refund_returns_inserted_coins() {
        let mut ledger = ledger(&[5, 15]);
        ledger.load_coins(d(5), 4).unwrap();
        ledger.insert_coin(d(15)).unwrap();
        ledger.insert_coin(d(5)).unwrap();
        ledger.insert_coin(d(15)).unwrap();
        let inventory = ledger.inventory().clone();

        let mut refunded = ledger.refund();
        refunded.sort();
        assert_eq!(refunded, vec![d(5), d(15), d(15)]);
        assert_eq!(ledger.total_inserted(), 0);
        assert_eq!(ledger.inventory(), &inventory);
    }

    #[test]
    fn test_refund_twice_is_a_no_op() {
        let mut ledger = ledger(&[15]);
        ledger.insert_coin(d(15)).unwrap();
        assert_eq!(ledger.refund(), vec![d(15)]);

        let before = snapshot(&ledger);
        assert!(ledger.refund().is_empty());
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn test_change_for_purchase() {
        let mut ledger = ledger(&[5, 10, 15]);
        ledger.load_coins(d(5), 1).unwrap();
        ledger.insert_coin(d(15)).unwrap();

        let plan = ledger.try_accept_payment_and_dispense_change(5).unwrap();
        assert_eq!(plan.get(d(5)), 1);
        assert_eq!(ledger.inventory().get(d(5)), Some(0));
        assert_eq!(ledger.inventory().get(d(15)), Some(1));
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_exact_payment_needs_no_change() {
        let mut ledger = ledger(&[10]);
        ledger.insert_coin(d(10)).unwrap();
        let plan = ledger.try_accept_payment_and_dispense_change(0).unwrap();
        assert!(plan.is_empty());
        assert_eq!(ledger.inventory().get(d(10)), Some(1));
    }

    #[test]
    fn test_change_not_possible_changes_nothing() {
        let mut ledger = scripted(&[5, 10, 15], None);
        ledger.load_coins(d(5), 1).unwrap();
        ledger.insert_coin(d(15)).unwrap();
        let before = snapshot(&ledger);

        let result = ledger.try_accept_payment_and_dispense_change(5);
        assert!(matches!(
            result,
            Err(VendingError::ChangeNotPossible { change: 5 })
        ));
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn test_change_greater_than_payment() {
        let mut ledger = ledger(&[15]);
        ledger.load_coins(d(15), 10).unwrap();
        ledger.insert_coin(d(15)).unwrap();
        let before = snapshot(&ledger);

        let result = ledger.try_accept_payment_and_dispense_change(30);
        assert!(matches!(
            result,
            Err(VendingError::ChangeExceedsPayment {
                change: 30,
                inserted: 15
            })
        ));
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn test_change_beyond_stock_is_refused_quickly() {
        let largest = i64::from(u32::MAX);
        let mut ledger = ledger(&[largest]);
        ledger.insert_coin(d(largest)).unwrap();
        let before = snapshot(&ledger);

        let result = ledger.try_accept_payment_and_dispense_change(largest);
        assert!(matches!(
            result,
            Err(VendingError::ChangeNotPossible { change }) if change == u64::from(u32::MAX)
        ));
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn test_negative_change_is_rejected() {
        let mut ledger = ledger(&[15]);
        ledger.insert_coin(d(15)).unwrap();
        assert!(matches!(
            ledger.try_accept_payment_and_dispense_change(-5),
            Err(VendingError::InvalidArgument(_))
        ));
        assert_eq!(ledger.total_inserted(), 15);
    }

    #[test]
    fn test_inserted_coins_are_not_used_as_own_change() {
        let mut ledger = ledger(&[5, 10]);
        ledger.insert_coin(d(5)).unwrap();
        ledger.insert_coin(d(5)).unwrap();
        let before = snapshot(&ledger);

        // 5 of the 10 paid comes back, but the machine holds no 5s of its own yet.
        let result = ledger.try_accept_payment_and_dispense_change(5);
        assert!(matches!(result, Err(VendingError::ChangeNotPossible { .. })));
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn test_full_coin_slot_rolls_back_payment() {
        let mut ledger = ledger(&[5, 10]);
        ledger.load_coins(d(10), i64::from(u32::MAX)).unwrap();
        ledger.load_coins(d(5), 1).unwrap();
        ledger.insert_coin(d(5)).unwrap();
        ledger.insert_coin(d(10)).unwrap();
        let before = snapshot(&ledger);

        let result = ledger.try_accept_payment_and_dispense_change(5);
        assert!(matches!(result, Err(VendingError::PaymentNotAccepted(_))));
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn test_plan_beyond_supply_is_refused() {
        let oversized: ChangePlan = [(d(5), 3)].into_iter().collect();
        let mut ledger = scripted(&[5, 20], Some(oversized));
        ledger.load_coins(d(5), 1).unwrap();
        ledger.insert_coin(d(20)).unwrap();
        let before = snapshot(&ledger);

        let result = ledger.try_accept_payment_and_dispense_change(15);
        assert!(matches!(result, Err(VendingError::PaymentNotAccepted(_))));
        assert_eq!(snapshot(&ledger), before);
    }

    #[test]
    fn test_purchase_keeps_value_of_price() {
        let mut ledger = ledger(&[1, 2, 5, 10, 20, 50, 100]);
        for denomination in [1, 2, 5, 10, 20, 50] {
            ledger.load_coins(d(denomination), 5).unwrap();
        }
        let value_before = ledger.inventory().total_value();

        for coin in [100, 50, 20] {
            ledger.insert_coin(d(coin)).unwrap();
        }
        let inserted = ledger.total_inserted();
        let price = 135;
        let plan = ledger
            .try_accept_payment_and_dispense_change((inserted - price) as i64)
            .unwrap();

        assert_eq!(plan.total(), inserted - price);
        assert_eq!(
            ledger.inventory().total_value(),
            value_before + u128::from(price)
        );
        assert!(ledger.pending().is_empty());
    }

    #[test]
    fn test_failed_purchase_can_still_be_refunded() {
        let mut ledger = ledger(&[5, 10]);
        ledger.insert_coin(d(10)).unwrap();
        assert!(ledger.try_accept_payment_and_dispense_change(5).is_err());
        assert_eq!(ledger.refund(), vec![d(10)]);
        assert_eq!(ledger.inventory().total_value(), 0);
    }
}
