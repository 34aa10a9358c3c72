//! Carts Service
//!
//! Loads and persists the buyer's cart document. Every persist overwrites the
//! whole document with the current cart, so the last write always holds the
//! latest full snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use harvest::{cart::Cart, ids::BuyerUuid};
use mockall::automock;
use rusty_money::iso::Currency;
use tracing::debug;

use crate::{
    domain::carts::{
        CartsServiceError,
        records::{CartDocument, CartItemRecord, cart_path},
    },
    store::{self, DocumentStore},
};

#[derive(Clone)]
pub struct StoreCartsService {
    store: Arc<dyn DocumentStore>,
    currency: &'static Currency,
}

impl StoreCartsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, currency: &'static Currency) -> Self {
        Self { store, currency }
    }
}

impl std::fmt::Debug for StoreCartsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCartsService")
            .field("currency", &self.currency.iso_alpha_code)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CartsService for StoreCartsService {
    #[tracing::instrument(
        name = "carts.service.load_cart",
        skip(self),
        fields(buyer_uuid = %buyer),
        err
    )]
    async fn load_cart(&self, buyer: BuyerUuid) -> Result<Cart, CartsServiceError> {
        let path = cart_path(buyer);

        let Some(document) = self.store.get_document(&path).await? else {
            self.store
                .set_document(&path, store::encode(&CartDocument::default())?)
                .await?;

            debug!("initialized empty cart");

            return Ok(Cart::new(self.currency));
        };

        let document: CartDocument = store::decode(document)?;
        let lines = document
            .items
            .into_iter()
            .map(|record| record.into_line(self.currency));

        let cart = Cart::from_lines(self.currency, lines)?;

        debug!(line_count = cart.line_count(), "loaded cart");

        Ok(cart)
    }

    #[tracing::instrument(
        name = "carts.service.save_cart",
        skip(self, cart),
        fields(buyer_uuid = %buyer, line_count = cart.line_count()),
        err
    )]
    async fn save_cart(&self, buyer: BuyerUuid, cart: &Cart) -> Result<(), CartsServiceError> {
        let document = CartDocument {
            items: cart.lines().map(CartItemRecord::from_line).collect(),
        };

        self.store
            .set_document(&cart_path(buyer), store::encode(&document)?)
            .await?;

        debug!("persisted cart");

        Ok(())
    }
}

#[automock]
#[async_trait]
pub trait CartsService: Send + Sync {
    /// Load the buyer's cart, creating an empty cart document on first use.
    async fn load_cart(&self, buyer: BuyerUuid) -> Result<Cart, CartsServiceError>;

    /// Overwrite the buyer's cart document with `cart`.
    async fn save_cart(&self, buyer: BuyerUuid, cart: &Cart) -> Result<(), CartsServiceError>;
}
