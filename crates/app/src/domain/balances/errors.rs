//! Balances service errors.

use rusty_money::MoneyError;
use thiserror::Error;

use crate::store::{DocumentError, StoreError};

#[derive(Debug, Error)]
pub enum BalancesServiceError {
    #[error("amount must be positive")]
    InvalidAmount,

    #[error("amount is in the wrong currency")]
    Currency(#[from] MoneyError),

    #[error("balance changed concurrently")]
    Conflict,

    #[error("storage error")]
    Store(#[source] StoreError),

    #[error("invalid balance document")]
    Document(#[from] DocumentError),
}

impl From<StoreError> for BalancesServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::PreconditionFailed(_) => Self::Conflict,
            other => Self::Store(other),
        }
    }
}
