//! Orders service errors.

use harvest::orders::OrderError;
use thiserror::Error;

use crate::store::{DocumentError, StoreError};

#[derive(Debug, Error)]
pub enum OrdersServiceError {
    #[error("order not found")]
    NotFound,

    #[error("invalid status transition")]
    Transition(#[from] OrderError),

    #[error("order changed concurrently")]
    Conflict,

    #[error("storage error")]
    Store(#[source] StoreError),

    #[error("invalid order document")]
    Document(#[from] DocumentError),
}

impl From<StoreError> for OrdersServiceError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::PreconditionFailed(_) => Self::Conflict,
            other => Self::Store(other),
        }
    }
}
