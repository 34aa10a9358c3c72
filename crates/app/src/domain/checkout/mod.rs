//! Checkout
//!
//! Commits a validated checkout attempt as one atomic batch: the order, the
//! optional balance debit with its ledger entry, and the optional stock
//! decrement either all land or none do.

pub mod errors;
pub mod presenter;
pub mod service;

pub use errors::{CheckoutError, CommitError};
pub use presenter::*;
pub use service::*;
