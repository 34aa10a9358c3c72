//! Bundles service errors.

use harvest::bundles::BundleError;
use thiserror::Error;

use crate::domain::products::ProductsServiceError;

#[derive(Debug, Error)]
pub enum BundlesServiceError {
    #[error("bundle product not found")]
    NotFound,

    #[error("product is not a bundle")]
    NotABundle,

    #[error("bundle could not be priced")]
    Pricing(#[from] BundleError),

    #[error("bundle lookup failed")]
    Products(#[source] ProductsServiceError),
}

impl From<ProductsServiceError> for BundlesServiceError {
    fn from(error: ProductsServiceError) -> Self {
        match error {
            ProductsServiceError::NotFound => Self::NotFound,
            other => Self::Products(other),
        }
    }
}
