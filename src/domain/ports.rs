use super::coin::{ChangePlan, Inventory};
use super::product::Product;
use crate::error::Result;
use async_trait::async_trait;

/// Computes which coins to pay out for a requested amount.
///
/// Implementations must not assume ownership of the inventory: they only read it.
pub trait ChangeSolver: Send + Sync {
    /// Returns `Ok(None)` when no combination within the inventory's supply
    /// sums exactly to `amount`.
    fn calculate(&self, inventory: &Inventory, amount: i64) -> Result<Option<ChangePlan>>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn store(&self, product: Product) -> Result<()>;
    async fn get(&self, product_id: u32) -> Result<Option<Product>>;
    async fn all_products(&self) -> Result<Vec<Product>>;
}

pub type ChangeSolverBox = Box<dyn ChangeSolver>;
pub type ProductStoreBox = Box<dyn ProductStore>;
