//! Application layer orchestrating a purchase.
//!
//! This module defines the `VendingMachine`, which puts a product menu in
//! front of the coin ledger and serialises access to it with a `tokio` mutex.

pub mod machine;
