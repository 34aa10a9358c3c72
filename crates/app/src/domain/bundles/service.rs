//! Bundles Service
//!
//! Resolves constituent prices through the products service. A constituent
//! that cannot be looked up contributes zero and is reported in
//! [`BundlePricing::missing`]; it never fails the resolution. Lookups that
//! failed on a store outage are also listed in [`BundlePricing::unavailable`].

use std::sync::Arc;

use async_trait::async_trait;
use harvest::{
    bundles::{Bundle, BundlePricing, bundle_pricing},
    ids::ProductUuid,
};
use mockall::automock;
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::domain::{bundles::BundlesServiceError, products::ProductsService};

#[derive(Clone)]
pub struct StoreBundlesService {
    products: Arc<dyn ProductsService>,
}

impl StoreBundlesService {
    #[must_use]
    pub fn new(products: Arc<dyn ProductsService>) -> Self {
        Self { products }
    }
}

impl std::fmt::Debug for StoreBundlesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBundlesService").finish_non_exhaustive()
    }
}

#[async_trait]
impl BundlesService for StoreBundlesService {
    #[tracing::instrument(
        name = "bundles.service.resolve",
        skip(self, bundle),
        fields(bundle_uuid = %bundle.product, component_count = bundle.components.len()),
        err
    )]
    async fn resolve(&self, bundle: &Bundle) -> Result<BundlePricing, BundlesServiceError> {
        let mut resolved = Vec::with_capacity(bundle.components.len());
        let mut unavailable = SmallVec::new();

        for component in &bundle.components {
            let price = match self.products.get_product(component.product).await {
                Ok(product) => Some(product.price),
                Err(error) => {
                    let transient = error.is_transient();

                    warn!(
                        product_uuid = %component.product,
                        %error,
                        transient,
                        "bundle constituent unresolved, counting as zero"
                    );

                    if transient {
                        unavailable.push(component.product);
                    }

                    None
                }
            };

            resolved.push((*component, price));
        }

        let mut pricing = bundle_pricing(bundle.price, &resolved)?;
        pricing.unavailable = unavailable;

        debug!(
            discount_percent = pricing.discount_percent,
            missing = pricing.missing.len(),
            unavailable = pricing.unavailable.len(),
            "resolved bundle pricing"
        );

        Ok(pricing)
    }

    #[tracing::instrument(
        name = "bundles.service.resolve_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn resolve_product(
        &self,
        product: ProductUuid,
    ) -> Result<BundlePricing, BundlesServiceError> {
        let bundle = self
            .products
            .get_product(product)
            .await?
            .as_bundle()
            .ok_or(BundlesServiceError::NotABundle)?;

        self.resolve(&bundle).await
    }
}

#[automock]
#[async_trait]
pub trait BundlesService: Send + Sync {
    /// Price a bundle from its constituents' current prices.
    async fn resolve(&self, bundle: &Bundle) -> Result<BundlePricing, BundlesServiceError>;

    /// Load a bundle product and price it.
    async fn resolve_product(
        &self,
        product: ProductUuid,
    ) -> Result<BundlePricing, BundlesServiceError>;
}
