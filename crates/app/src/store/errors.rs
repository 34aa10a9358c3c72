//! Document store errors.

use std::time::Duration;

use thiserror::Error;

use super::DocumentPath;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum StoreError {
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("document not found: {0}")]
    NotFound(DocumentPath),

    #[error("batch precondition failed for {0}")]
    PreconditionFailed(DocumentPath),

    #[error("write rejected for {0}")]
    Rejected(DocumentPath),
}

impl StoreError {
    /// Whether the failure may clear up on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Unavailable(_))
    }
}
