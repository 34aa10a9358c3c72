//! Carts service errors.

use harvest::cart::CartError;
use thiserror::Error;

use crate::store::{DocumentError, StoreError};

#[derive(Debug, Error)]
pub enum CartsServiceError {
    #[error("storage error")]
    Store(#[from] StoreError),

    #[error("invalid cart document")]
    Document(#[from] DocumentError),

    #[error("stored cart is inconsistent")]
    Cart(#[from] CartError),
}

/// A persist that did not complete. The in-memory cart stays authoritative and
/// is written again on the next mutation or flush.
#[derive(Debug, Error)]
#[error("cart sync deferred after {failures} consecutive failures")]
pub struct SyncError {
    /// Failed persists since the last success, including this one.
    pub failures: u32,

    #[source]
    pub cause: CartsServiceError,
}
