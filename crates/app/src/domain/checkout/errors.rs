//! Checkout service errors.

use harvest::{checkout::AttemptError, ids::ProductUuid};
use rusty_money::MoneyError;
use thiserror::Error;

use crate::store::{DocumentError, StoreError};

/// The commit did not happen. Nothing was written.
#[derive(Debug, Error)]
pub enum CommitError {
    #[error("balance changed before commit")]
    BalanceChanged {
        /// Total in minor units.
        required: i64,
        /// Balance re-read at commit, in minor units.
        available: i64,
    },

    #[error("stock changed before commit")]
    StockChanged { available: u32, requested: u32 },

    #[error("product {0} is no longer available")]
    ProductUnavailable(ProductUuid),

    #[error("order is priced in another currency: {0}")]
    Currency(#[from] MoneyError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid document: {0}")]
    Document(#[from] DocumentError),
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Attempt(#[from] AttemptError),

    #[error("payment failed, retry")]
    Commit(#[from] CommitError),
}
