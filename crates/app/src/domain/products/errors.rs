//! Products service errors.

use thiserror::Error;

use crate::store::{DocumentError, StoreError};

#[derive(Debug, Error)]
pub enum ProductsServiceError {
    #[error("product not found")]
    NotFound,

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("invalid product document: {0}")]
    Document(#[from] DocumentError),
}

impl ProductsServiceError {
    /// Whether the lookup may succeed if tried again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(cause) if cause.is_transient())
    }
}
