//! Payments service errors.

use thiserror::Error;

use crate::{
    domain::balances::BalancesServiceError,
    store::{DocumentError, StoreError},
};

#[derive(Debug, Error)]
pub enum PaymentsServiceError {
    #[error("card not found")]
    CardNotFound,

    #[error("invalid card details")]
    InvalidCard,

    #[error("balance lookup failed")]
    Balances(#[from] BalancesServiceError),

    #[error("storage error")]
    Store(#[from] StoreError),

    #[error("invalid card document")]
    Document(#[from] DocumentError),
}
