//! Harvest
//!
//! Harvest is the cart aggregation and order-commit core of a farm storefront: a
//! seller-grouped shopping cart, bundle pricing, payment instrument selection and
//! the checkout attempt state machine. Everything here is pure and synchronous;
//! persistence lives in `harvest-app`.

pub mod bundles;
pub mod cart;
pub mod checkout;
pub mod ids;
pub mod orders;
pub mod payments;
pub mod prelude;
pub mod prices;
