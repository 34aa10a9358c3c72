//! Products Service

use std::sync::Arc;

use async_trait::async_trait;
use harvest::ids::ProductUuid;
use mockall::automock;
use rusty_money::iso::Currency;
use tracing::debug;

use crate::{
    domain::products::{
        ProductsServiceError,
        models::Product,
        records::{ProductRecord, product_path},
    },
    store::{self, DocumentStore},
};

#[derive(Clone)]
pub struct StoreProductsService {
    store: Arc<dyn DocumentStore>,
    currency: &'static Currency,
}

impl StoreProductsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, currency: &'static Currency) -> Self {
        Self { store, currency }
    }
}

impl std::fmt::Debug for StoreProductsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreProductsService")
            .field("currency", &self.currency.iso_alpha_code)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl ProductsService for StoreProductsService {
    #[tracing::instrument(
        name = "products.service.get_product",
        skip(self),
        fields(product_uuid = %product),
        err
    )]
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError> {
        let document = self
            .store
            .get_document(&product_path(product))
            .await?
            .ok_or(ProductsServiceError::NotFound)?;

        let record: ProductRecord = store::decode(document)?;

        Ok(Product::from_record(product, record, self.currency))
    }

    #[tracing::instrument(
        name = "products.service.put_product",
        skip(self, product),
        fields(product_uuid = %product.uuid),
        err
    )]
    async fn put_product(&self, product: Product) -> Result<Product, ProductsServiceError> {
        let document = store::encode(&product.to_record())?;

        self.store
            .set_document(&product_path(product.uuid), document)
            .await?;

        debug!("stored product");

        Ok(product)
    }
}

#[automock]
#[async_trait]
pub trait ProductsService: Send + Sync {
    /// Retrieve a single product.
    async fn get_product(&self, product: ProductUuid) -> Result<Product, ProductsServiceError>;

    /// Create or replace a product.
    async fn put_product(&self, product: Product) -> Result<Product, ProductsServiceError>;
}
