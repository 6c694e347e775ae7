use crate::domain::coin::{ChangePlan, Denomination, Inventory};
use crate::domain::converter::DenominationConverter;
use crate::domain::ledger::CoinLedger;
use crate::domain::ports::ProductStoreBox;
use crate::domain::product::Product;
use crate::error::{Result, VendingError};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Outcome of a successful purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Vend {
    pub product: Product,
    pub change: ChangePlan,
}

/// A vending machine: a product menu in front of a coin ledger.
///
/// `VendingMachine` is the single owned instance the console drives. The
/// ledger sits behind one mutex that is held for the whole of a purchase, so
/// no insert or load can land in the middle of a payment.
pub struct VendingMachine {
    ledger: Mutex<CoinLedger>,
    products: ProductStoreBox,
    converter: DenominationConverter,
}

impl VendingMachine {
    /// Creates a new `VendingMachine`.
    ///
    /// # Arguments
    ///
    /// * `ledger` - The coin ledger, already initialised with the accepted denominations.
    /// * `products` - The store holding the product menu.
    /// * `converter` - Maps prices in real currency to coin units.
    pub fn new(
        ledger: CoinLedger,
        products: ProductStoreBox,
        converter: DenominationConverter,
    ) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            products,
            converter,
        }
    }

    pub fn converter(&self) -> &DenominationConverter {
        &self.converter
    }

    /// Adds a product to the menu, replacing the price of an existing id.
    pub async fn load_product(&self, product: Product) -> Result<()> {
        self.products.store(product).await
    }

    pub async fn products(&self) -> Result<Vec<Product>> {
        self.products.all_products().await
    }

    pub async fn load_coins(&self, denomination: Denomination, count: i64) -> Result<()> {
        self.ledger.lock().await.load_coins(denomination, count)
    }

    pub async fn insert_coin(&self, denomination: Denomination) -> Result<()> {
        self.ledger.lock().await.insert_coin(denomination)
    }

    pub async fn refund(&self) -> Vec<Denomination> {
        self.ledger.lock().await.refund()
    }

    /// Money inserted by the current customer, in real currency.
    pub async fn amount_inserted(&self) -> Result<Decimal> {
        let units = self.ledger.lock().await.total_inserted();
        let units = i64::try_from(units)
            .map_err(|_| VendingError::Overflow(format!("{units} units inserted")))?;
        Ok(self.converter.to_decimal(units))
    }

    pub async fn accepted_denominations(&self) -> Vec<Denomination> {
        self.ledger.lock().await.accepted_denominations().collect()
    }

    /// Snapshot of the machine's coin inventory.
    pub async fn inventory(&self) -> Inventory {
        self.ledger.lock().await.inventory().clone()
    }

    /// Buys `product_id` with the coins inserted so far.
    ///
    /// On success the payment is kept, change is paid out and the product is
    /// dispensed. On failure the coins stay inserted, except when the price
    /// cannot be expressed in coin units, in which case they are refunded.
    pub async fn purchase(&self, product_id: u32) -> Result<Vend> {
        let Some(product) = self.products.get(product_id).await? else {
            return Err(VendingError::ProductNotFound(product_id));
        };

        let mut ledger = self.ledger.lock().await;
        let price = match self.converter.to_denomination(product.price) {
            Ok(price) if price >= 0 => price,
            Ok(price) => {
                return Err(refund_with(
                    &mut ledger,
                    VendingError::InvalidArgument(format!(
                        "Product ({product_id}) has a negative price of {price} units"
                    )),
                ));
            }
            Err(e) => return Err(refund_with(&mut ledger, e)),
        };

        let inserted = i64::try_from(ledger.total_inserted())
            .map_err(|_| VendingError::Overflow("amount inserted".to_string()))?;
        if inserted < price {
            let shortfall = self.converter.to_decimal(price - inserted);
            warn!(product_id, %shortfall, "Not enough money inserted");
            return Err(VendingError::InsufficientFunds {
                price: product.price,
                shortfall,
            });
        }

        let change = ledger.try_accept_payment_and_dispense_change(inserted - price)?;
        info!(product_id, name = %product.name, "Product dispensed");
        Ok(Vend { product, change })
    }
}

/// Hands the inserted coins back and wraps `error` with what was returned.
fn refund_with(ledger: &mut CoinLedger, error: VendingError) -> VendingError {
    let refunded = ledger.refund();
    warn!(coins = refunded.len(), "Price cannot be paid in coins, refunding: {error}");
    VendingError::PurchaseRefunded {
        source: Box::new(error),
        refunded,
    }
}
