//! Cart Sessions
//!
//! A session owns the in-memory cart for one buyer and persists it after each
//! mutation that changes persisted fields. Selection changes stay local. When
//! a persist fails the cart is kept as the source of truth, marked dirty, and
//! written again on the next mutation or an explicit [`CartSession::flush`].

use std::sync::Arc;

use harvest::{
    cart::{Cart, CartError, CartLineItem},
    ids::{BuyerUuid, ProductUuid, SellerUuid},
};
use tracing::{debug, warn};

use crate::domain::carts::{CartsService, CartsServiceError, SyncError};

/// Result of persisting after a mutation.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The current cart was written.
    Persisted,

    /// Nothing changed and nothing was pending.
    Unchanged,

    /// The write did not complete and will be retried.
    Deferred(SyncError),
}

impl SyncOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted)
    }

    pub fn is_deferred(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }
}

pub struct CartSession {
    carts: Arc<dyn CartsService>,
    buyer: BuyerUuid,
    cart: Cart,
    dirty: bool,
    failures: u32,
}

impl std::fmt::Debug for CartSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartSession")
            .field("buyer", &self.buyer)
            .field("cart", &self.cart)
            .field("dirty", &self.dirty)
            .field("failures", &self.failures)
            .finish_non_exhaustive()
    }
}

impl CartSession {
    /// Load the buyer's cart and start a session on it.
    ///
    /// # Errors
    ///
    /// Returns a [`CartsServiceError`] if the cart cannot be loaded.
    pub async fn open(
        carts: Arc<dyn CartsService>,
        buyer: BuyerUuid,
    ) -> Result<Self, CartsServiceError> {
        let cart = carts.load_cart(buyer).await?;

        Ok(Self {
            carts,
            buyer,
            cart,
            dirty: false,
            failures: 0,
        })
    }

    pub fn buyer(&self) -> BuyerUuid {
        self.buyer
    }

    pub fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Whether changes are waiting to be persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Failed persists since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.failures
    }

    /// Add a line, merging with an existing line for the same product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] without persisting if the line
    /// is priced in another currency.
    pub async fn add_item(&mut self, line: CartLineItem) -> Result<SyncOutcome, CartError> {
        let changed = self.cart.add_item(line)?;

        Ok(self.sync(changed).await)
    }

    /// A single line arriving from outside the cart screen, such as a product
    /// page's "add to cart".
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] without persisting if the line
    /// is priced in another currency.
    pub async fn merge_incoming_line(
        &mut self,
        line: CartLineItem,
    ) -> Result<SyncOutcome, CartError> {
        debug!(product_uuid = %line.product, quantity = line.quantity, "merging incoming line");

        self.add_item(line).await
    }

    pub async fn set_quantity(
        &mut self,
        seller: SellerUuid,
        product: ProductUuid,
        quantity: i64,
    ) -> SyncOutcome {
        let changed = self.cart.set_quantity(seller, product, quantity);

        self.sync(changed).await
    }

    pub async fn remove_item(&mut self, seller: SellerUuid, product: ProductUuid) -> SyncOutcome {
        let changed = self.cart.remove_item(seller, product);

        self.sync(changed).await
    }

    pub async fn remove_selected(&mut self) -> SyncOutcome {
        let changed = self.cart.remove_selected();

        self.sync(changed).await
    }

    pub fn toggle_item_selection(&mut self, seller: SellerUuid, product: ProductUuid) {
        self.cart.toggle_item_selection(seller, product);
    }

    pub fn toggle_group_selection(&mut self, seller: SellerUuid) {
        self.cart.toggle_group_selection(seller);
    }

    pub fn select_all(&mut self) {
        self.cart.select_all();
    }

    pub fn deselect_all(&mut self) {
        self.cart.deselect_all();
    }

    /// Persist pending changes, if any.
    pub async fn flush(&mut self) -> SyncOutcome {
        self.sync(false).await
    }

    async fn sync(&mut self, changed: bool) -> SyncOutcome {
        self.dirty |= changed;

        if !self.dirty {
            return SyncOutcome::Unchanged;
        }

        match self.carts.save_cart(self.buyer, &self.cart).await {
            Ok(()) => {
                self.dirty = false;
                self.failures = 0;

                SyncOutcome::Persisted
            }
            Err(cause) => {
                self.failures = self.failures.saturating_add(1);

                warn!(
                    buyer_uuid = %self.buyer,
                    failures = self.failures,
                    error = %cause,
                    "cart persist deferred"
                );

                SyncOutcome::Deferred(SyncError {
                    failures: self.failures,
                    cause,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Mutex, time::Duration};

    use rusty_money::{Money, iso};
    use testresult::TestResult;

    use crate::{
        domain::carts::{
            MockCartsService,
            records::{CartDocument, cart_path},
        },
        store::{self, StoreError},
        test::TestContext,
    };

    use super::*;

    fn line(seller: SellerUuid, product: ProductUuid, price: i64, quantity: u32) -> CartLineItem {
        CartLineItem::new(
            seller,
            "Dela Cruz Farm",
            product,
            "Carabao Mango",
            Money::from_minor(price, iso::PHP),
            quantity,
        )
    }

    fn offline() -> CartsServiceError {
        CartsServiceError::Store(StoreError::Unavailable("offline".to_string()))
    }

    /// Mock service that records every saved cart and fails the first `fail` saves.
    fn recording_service(fail: usize, saved: Arc<Mutex<Vec<Cart>>>) -> MockCartsService {
        let mut carts = MockCartsService::new();
        let mut remaining = fail;

        carts
            .expect_load_cart()
            .returning(|_| Ok(Cart::new(iso::PHP)));

        carts.expect_save_cart().returning(move |_, cart| {
            if remaining > 0 {
                remaining -= 1;
                return Err(offline());
            }

            if let Ok(mut saved) = saved.lock() {
                saved.push(cart.clone());
            }

            Ok(())
        });

        carts
    }

    #[tokio::test]
    async fn adding_same_product_twice_merges_and_persists_each_time() -> TestResult {
        let ctx = TestContext::new();
        let mut session = CartSession::open(ctx.carts_service(), ctx.buyer).await?;
        let seller = SellerUuid::new();
        let product = ProductUuid::new();

        let first = session.add_item(line(seller, product, 40_00, 2)).await?;
        let second = session
            .merge_incoming_line(line(seller, product, 40_00, 1))
            .await?;

        assert!(first.is_persisted());
        assert!(second.is_persisted());
        assert_eq!(session.cart().line_count(), 1);
        assert_eq!(
            session.cart().item(seller, product).map(|item| item.quantity),
            Some(3)
        );

        let stored = ctx.carts.load_cart(ctx.buyer).await?;

        assert_eq!(&stored, session.cart());

        Ok(())
    }

    #[tokio::test]
    async fn selection_changes_are_local_only() -> TestResult {
        let ctx = TestContext::new();
        let mut session = CartSession::open(ctx.carts_service(), ctx.buyer).await?;
        let seller = SellerUuid::new();

        session
            .add_item(line(seller, ProductUuid::new(), 40_00, 2))
            .await?;

        let writes = ctx.memory.write_count().await;

        session.toggle_group_selection(seller);
        session.select_all();
        session.deselect_all();

        assert_eq!(ctx.memory.write_count().await, writes);
        assert!(!session.is_dirty());

        Ok(())
    }

    #[tokio::test]
    async fn no_op_mutations_do_not_persist() -> TestResult {
        let ctx = TestContext::new();
        let mut session = CartSession::open(ctx.carts_service(), ctx.buyer).await?;
        let seller = SellerUuid::new();
        let product = ProductUuid::new();

        session.add_item(line(seller, product, 40_00, 2)).await?;

        let writes = ctx.memory.write_count().await;

        assert!(matches!(
            session.set_quantity(seller, product, 0).await,
            SyncOutcome::Unchanged
        ));
        assert!(matches!(
            session.set_quantity(seller, product, -1).await,
            SyncOutcome::Unchanged
        ));
        assert!(matches!(
            session.remove_item(SellerUuid::new(), product).await,
            SyncOutcome::Unchanged
        ));
        assert_eq!(ctx.memory.write_count().await, writes);
        assert_eq!(
            session.cart().item(seller, product).map(|item| item.quantity),
            Some(2)
        );

        Ok(())
    }

    #[tokio::test]
    async fn removing_selected_group_persists_without_empty_group() -> TestResult {
        let ctx = TestContext::new();
        let mut session = CartSession::open(ctx.carts_service(), ctx.buyer).await?;
        let mangoes = SellerUuid::new();
        let rice = SellerUuid::new();
        let dinorado = ProductUuid::new();

        session
            .add_item(line(mangoes, ProductUuid::new(), 40_00, 2))
            .await?;
        session
            .add_item(line(mangoes, ProductUuid::new(), 25_00, 1))
            .await?;
        session.add_item(line(rice, dinorado, 80_00, 1)).await?;

        session.toggle_group_selection(mangoes);

        let outcome = session.remove_selected().await;

        assert!(outcome.is_persisted(), "expected Persisted, got {outcome:?}");

        let stored = ctx.carts.load_cart(ctx.buyer).await?;

        assert!(stored.group(mangoes).is_none(), "removed group should be gone");
        assert_eq!(stored.groups().len(), 1);
        assert!(
            stored.groups().iter().all(|group| !group.items().is_empty()),
            "no empty group should be stored"
        );
        assert!(stored.item(rice, dinorado).is_some());

        Ok(())
    }

    #[tokio::test]
    async fn removing_last_line_of_group_persists_cascade() -> TestResult {
        let ctx = TestContext::new();
        let mut session = CartSession::open(ctx.carts_service(), ctx.buyer).await?;
        let mangoes = SellerUuid::new();
        let rice = SellerUuid::new();
        let mango = ProductUuid::new();

        session.add_item(line(mangoes, mango, 40_00, 2)).await?;
        session
            .add_item(line(rice, ProductUuid::new(), 80_00, 1))
            .await?;

        let outcome = session.remove_item(mangoes, mango).await;

        assert!(outcome.is_persisted(), "expected Persisted, got {outcome:?}");

        let stored = ctx.carts.load_cart(ctx.buyer).await?;

        assert!(stored.group(mangoes).is_none(), "empty group should be dropped");
        assert!(stored.group(rice).is_some());
        assert_eq!(&stored, session.cart());

        Ok(())
    }

    #[tokio::test]
    async fn failed_persist_is_retried_on_next_mutation() -> TestResult {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let carts = recording_service(1, Arc::clone(&saved));
        let mut session = CartSession::open(Arc::new(carts), BuyerUuid::new()).await?;
        let seller = SellerUuid::new();
        let mango = ProductUuid::new();
        let rice = ProductUuid::new();

        let first = session.add_item(line(seller, mango, 40_00, 2)).await?;

        assert!(
            matches!(first, SyncOutcome::Deferred(SyncError { failures: 1, .. })),
            "expected Deferred, got {first:?}"
        );
        assert!(session.is_dirty());

        let second = session.add_item(line(seller, rice, 55_00, 1)).await?;

        assert!(second.is_persisted());
        assert!(!session.is_dirty());
        assert_eq!(session.consecutive_failures(), 0);

        let saved = saved.lock().map(|saved| saved.clone()).unwrap_or_default();

        assert_eq!(saved.len(), 1, "only the retried write should land");
        assert_eq!(saved.first().map(Cart::line_count), Some(2));

        Ok(())
    }

    #[tokio::test]
    async fn no_op_mutation_still_retries_pending_write() -> TestResult {
        let saved = Arc::new(Mutex::new(Vec::new()));
        let carts = recording_service(1, Arc::clone(&saved));
        let mut session = CartSession::open(Arc::new(carts), BuyerUuid::new()).await?;
        let seller = SellerUuid::new();
        let product = ProductUuid::new();

        let first = session.add_item(line(seller, product, 40_00, 2)).await?;

        assert!(first.is_deferred(), "expected Deferred, got {first:?}");

        let outcome = session.set_quantity(seller, product, 0).await;

        assert!(outcome.is_persisted());

        Ok(())
    }

    #[tokio::test]
    async fn consecutive_failures_are_counted_until_flush_succeeds() -> TestResult {
        let ctx = TestContext::new();
        let mut session = CartSession::open(ctx.carts_service(), ctx.buyer).await?;
        let seller = SellerUuid::new();
        let product = ProductUuid::new();

        ctx.memory.set_offline(true).await;

        session.add_item(line(seller, product, 40_00, 1)).await?;
        session.set_quantity(seller, product, 4).await;

        let outcome = session.flush().await;

        assert!(
            matches!(outcome, SyncOutcome::Deferred(SyncError { failures: 3, .. })),
            "expected third failure, got {outcome:?}"
        );
        assert_eq!(
            session.cart().item(seller, product).map(|item| item.quantity),
            Some(4),
            "in-memory cart stays authoritative"
        );

        ctx.memory.set_offline(false).await;

        assert!(session.flush().await.is_persisted());
        assert!(matches!(session.flush().await, SyncOutcome::Unchanged));

        let stored = ctx
            .memory
            .document(&cart_path(ctx.buyer))
            .await
            .map(store::decode::<CartDocument>)
            .transpose()?;

        assert_eq!(
            stored.and_then(|doc| doc.items.first().map(|item| item.quantity)),
            Some(4)
        );

        Ok(())
    }

    #[tokio::test]
    async fn timed_out_persist_is_deferred() -> TestResult {
        let ctx = TestContext::with_timeout(Duration::from_millis(10));
        let mut session = CartSession::open(ctx.carts_service(), ctx.buyer).await?;

        ctx.memory
            .set_latency(Some(Duration::from_millis(200)))
            .await;

        let outcome = session
            .add_item(line(SellerUuid::new(), ProductUuid::new(), 40_00, 1))
            .await?;

        assert!(
            matches!(
                outcome,
                SyncOutcome::Deferred(SyncError {
                    cause: CartsServiceError::Store(StoreError::Timeout(_)),
                    ..
                })
            ),
            "expected timeout, got {outcome:?}"
        );
        assert!(session.is_dirty());

        Ok(())
    }

    #[tokio::test]
    async fn currency_mismatch_is_rejected_without_persisting() -> TestResult {
        let ctx = TestContext::new();
        let mut session = CartSession::open(ctx.carts_service(), ctx.buyer).await?;
        let writes = ctx.memory.write_count().await;

        let mut usd = line(SellerUuid::new(), ProductUuid::new(), 1_00, 1);
        usd.price = Money::from_minor(1_00, iso::USD);

        let result = session.add_item(usd).await;

        assert!(
            matches!(result, Err(CartError::CurrencyMismatch(..))),
            "expected CurrencyMismatch, got {result:?}"
        );
        assert_eq!(ctx.memory.write_count().await, writes);

        Ok(())
    }
}
