//! Harvest Domain Concerns

pub mod balances;
pub mod bundles;
pub mod carts;
pub mod checkout;
pub mod orders;
pub mod payments;
pub mod products;
