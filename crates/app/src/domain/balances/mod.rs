//! Balances
//!
//! The buyer's stored-value balance and its append-only ledger.

pub mod errors;
pub mod models;
pub mod records;
pub mod service;

pub use errors::BalancesServiceError;
pub use service::*;
