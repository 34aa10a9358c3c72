//! Checkout Service
//!
//! Validation runs against the selector's live data and never touches the
//! store. Committing re-reads stock and balance, then submits a single batch
//! guarded by preconditions on exactly the values it read, so a concurrent
//! purchase makes the batch fail rather than oversell or overdraw.

use std::sync::Arc;

use async_trait::async_trait;
use harvest::{
    checkout::{CheckoutAttempt, CheckoutConfirmation},
    ids::{BuyerUuid, OrderUuid},
    orders::OrderDraft,
    payments::{PaymentInstrument, PaymentSelector},
    prices,
};
use jiff::Timestamp;
use mockall::automock;
use rusty_money::iso::Currency;
use serde_json::Value;
use tracing::{Span, info, warn};

use crate::{
    domain::{
        balances::records::{
            BalanceRecord, LedgerEntryKind, LedgerEntryRecord, balance_path, post_entry,
        },
        checkout::{CheckoutError, CommitError},
        orders::records::{OrderRecord, order_path},
        products::records::{ProductRecord, STOCK, product_path},
    },
    store::{self, Batch, Document, DocumentStore, Precondition},
};

#[derive(Clone)]
pub struct StoreCheckoutService {
    store: Arc<dyn DocumentStore>,
    currency: &'static Currency,
}

impl StoreCheckoutService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, currency: &'static Currency) -> Self {
        Self { store, currency }
    }

    /// Build and submit the commit batch for `order`.
    async fn submit(
        &self,
        buyer: BuyerUuid,
        order: OrderUuid,
        draft: &OrderDraft,
        instrument: &PaymentInstrument,
    ) -> Result<(), CommitError> {
        prices::ensure_same_currency(&prices::zero(self.currency), &draft.total())?;

        let now = Timestamp::now();
        let product = draft.product();
        let requested = draft.quantity();

        let mut batch = Batch::new().require(Precondition::Missing(order_path(order)));

        let stored = self
            .store
            .get_document(&product_path(product.uuid))
            .await?
            .map(store::decode::<ProductRecord>)
            .transpose()?
            .ok_or(CommitError::ProductUnavailable(product.uuid))?;

        if let Some(available) = stored.stock {
            let remaining = available
                .checked_sub(requested)
                .ok_or(CommitError::StockChanged {
                    available,
                    requested,
                })?;

            batch = batch
                .require(Precondition::FieldEquals {
                    path: product_path(product.uuid),
                    field: STOCK.to_string(),
                    value: Value::from(available),
                })
                .update(
                    product_path(product.uuid),
                    Document::from_iter([(STOCK.to_string(), Value::from(remaining))]),
                );
        }

        if instrument.is_stored_balance() {
            let previous = self
                .store
                .get_document(&balance_path(buyer))
                .await?
                .map(store::decode::<BalanceRecord>)
                .transpose()?
                .map(|record| record.current_balance);

            let available = previous.unwrap_or(0);
            let required = draft.total().to_minor_units();

            if available < required {
                return Err(CommitError::BalanceChanged {
                    required,
                    available,
                });
            }

            let entry = LedgerEntryRecord {
                amount: required,
                kind: LedgerEntryKind::Debit,
                description: format!("Payment for {}", product.name),
                created_at: now,
                order_id: Some(order),
                new_balance: available - required,
            };

            batch = post_entry(batch, buyer, previous, &entry)?;
        }

        let record = OrderRecord::paid(order, buyer, draft, instrument.label(), now);

        batch = batch.set(order_path(order), store::encode(&record)?);

        self.store.run_atomic_batch(batch).await?;

        Ok(())
    }
}

impl std::fmt::Debug for StoreCheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCheckoutService")
            .field("currency", &self.currency.iso_alpha_code)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CheckoutService for StoreCheckoutService {
    #[tracing::instrument(
        name = "checkout.service.commit",
        skip(self, attempt, payment),
        fields(
            buyer_uuid = %buyer,
            product_uuid = %attempt.draft().product().uuid,
            total = attempt.draft().total().to_minor_units(),
            order_uuid = tracing::field::Empty
        ),
        err
    )]
    async fn commit(
        &self,
        buyer: BuyerUuid,
        attempt: &mut CheckoutAttempt,
        payment: &PaymentSelector,
    ) -> Result<CheckoutConfirmation, CheckoutError> {
        let instrument = attempt.validate(payment).inspect_err(|error| {
            warn!(%error, "checkout rejected before commit");
        })?;

        attempt.begin_commit()?;

        let order = OrderUuid::new();

        Span::current().record("order_uuid", tracing::field::display(order));

        match self.submit(buyer, order, attempt.draft(), &instrument).await {
            Ok(()) => {
                let confirmation = CheckoutConfirmation {
                    order,
                    payment_method: instrument.label(),
                    total: attempt.draft().total(),
                };

                attempt.commit_succeeded(confirmation.clone())?;

                info!(payment_method = %confirmation.payment_method, "order committed");

                Ok(confirmation)
            }
            Err(error) => {
                attempt.commit_failed(error.to_string())?;

                warn!(%error, "checkout commit failed");

                Err(error.into())
            }
        }
    }
}

#[automock]
#[async_trait]
pub trait CheckoutService: Send + Sync {
    /// Validate the attempt, then commit it as one atomic batch.
    ///
    /// On return the attempt is `Committed` or `Aborted`, unless it was not a
    /// draft to begin with.
    async fn commit(
        &self,
        buyer: BuyerUuid,
        attempt: &mut CheckoutAttempt,
        payment: &PaymentSelector,
    ) -> Result<CheckoutConfirmation, CheckoutError>;
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use harvest::{
        checkout::{AbortReason, AttemptError, CheckoutState, ValidationError},
        orders::{OrderStatus, PaymentStatus},
        orders::DeliveryOption,
        payments::{BankChannel, InstrumentId},
    };
    use jiff::civil::date;
    use rusty_money::{Money, iso};
    use testresult::TestResult;

    use crate::{
        domain::{
            balances::{BalancesService, records::LedgerEntryKind},
            orders::OrdersService,
            payments::{PaymentsService, data::NewCard},
            products::{ProductsService, models::Product},
        },
        store::{MockDocumentStore, StoreError},
        test::TestContext,
    };

    use super::*;

    async fn selector_with(
        ctx: &TestContext,
        instrument: InstrumentId,
    ) -> TestResult<PaymentSelector> {
        let mut selector = ctx.payments.load_selector(ctx.buyer).await?;
        selector.select(instrument)?;

        Ok(selector)
    }

    async fn stock_of(ctx: &TestContext, product: &Product) -> TestResult<Option<u32>> {
        Ok(ctx.products.get_product(product.uuid).await?.stock)
    }

    #[tokio::test]
    async fn balance_checkout_writes_order_debit_and_stock_together() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;
        ctx.fund(200_00).await?;

        let payment = selector_with(&ctx, InstrumentId::StoredBalance).await?;
        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 2)?);

        let confirmation = ctx.checkout.commit(ctx.buyer, &mut attempt, &payment).await?;

        assert_eq!(attempt.state(), CheckoutState::Committed);
        assert_eq!(attempt.confirmation(), Some(&confirmation));
        assert_eq!(confirmation.payment_method, "Wallet Balance");
        assert_eq!(confirmation.total, TestContext::php(80_00));

        let order = ctx.orders.get_order(confirmation.order).await?;

        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.payment_status, PaymentStatus::Paid);
        assert_eq!(order.buyer, ctx.buyer);
        assert_eq!(order.quantity, 2);
        assert_eq!(order.total, TestContext::php(80_00));
        assert_eq!(order.product.stock, Some(10), "snapshot keeps stock at order time");

        assert_eq!(
            ctx.balances.get_balance(ctx.buyer).await?,
            TestContext::php(120_00)
        );
        assert_eq!(stock_of(&ctx, &mango).await?, Some(8));

        let ledger = ctx.balances.ledger(ctx.buyer).await?;
        let debit = ledger
            .iter()
            .find(|entry| entry.kind == LedgerEntryKind::Debit)
            .ok_or("missing debit entry")?;

        assert_eq!(debit.order, Some(confirmation.order));
        assert_eq!(debit.amount, TestContext::php(80_00));
        assert_eq!(debit.new_balance, TestContext::php(120_00));

        Ok(())
    }

    #[tokio::test]
    async fn card_checkout_leaves_balance_untouched() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;
        ctx.fund(10_00).await?;

        let card = ctx
            .payments
            .add_card(
                ctx.buyer,
                NewCard {
                    brand: "Visa".to_string(),
                    last_four: "4242".to_string(),
                    expiry_month: 8,
                    expiry_year: 2029,
                    make_default: true,
                },
            )
            .await?;

        let mut payment = ctx.payments.load_selector(ctx.buyer).await?;
        assert!(payment.select_default_card());

        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 3)?);

        let confirmation = ctx.checkout.commit(ctx.buyer, &mut attempt, &payment).await?;

        assert_eq!(confirmation.payment_method, "Visa •••• 4242");
        assert_eq!(
            ctx.balances.get_balance(ctx.buyer).await?,
            TestContext::php(10_00)
        );
        assert_eq!(stock_of(&ctx, &mango).await?, Some(7));
        assert!(card.is_default);
        assert_eq!(
            ctx.orders.get_order(confirmation.order).await?.payment_method,
            "Visa •••• 4242"
        );

        Ok(())
    }

    #[tokio::test]
    async fn draft_in_another_currency_aborts_before_any_store_call() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;

        let mut snapshot = mango.snapshot();
        snapshot.price = Money::from_minor(40_00, iso::USD);

        let draft = OrderDraft::new(snapshot, 1, DeliveryOption::Pickup, date(2026, 10, 24))?;
        let payment = selector_with(&ctx, InstrumentId::Bank(BankChannel::GCash)).await?;

        // No expectations: any store call fails the test.
        let checkout = StoreCheckoutService::new(Arc::new(MockDocumentStore::new()), iso::PHP);
        let mut attempt = CheckoutAttempt::new(draft);

        let result = checkout.commit(ctx.buyer, &mut attempt, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Commit(CommitError::Currency(_)))
            ),
            "expected Currency, got {result:?}"
        );
        assert_eq!(attempt.state(), CheckoutState::Aborted);
        assert!(
            matches!(attempt.abort_reason(), Some(AbortReason::CommitFailed(_))),
            "expected CommitFailed, got {:?}",
            attempt.abort_reason()
        );

        Ok(())
    }

    #[tokio::test]
    async fn product_without_stock_counter_is_not_decremented() -> TestResult {
        let ctx = TestContext::new();
        let rice = ctx.product("Dinorado Rice", 55_00, None).await?;

        let payment = selector_with(&ctx, InstrumentId::Bank(BankChannel::GCash)).await?;
        let mut attempt = CheckoutAttempt::new(TestContext::draft(&rice, 5)?);

        let confirmation = ctx.checkout.commit(ctx.buyer, &mut attempt, &payment).await?;

        assert_eq!(confirmation.payment_method, "GCash");
        assert_eq!(stock_of(&ctx, &rice).await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn failed_stock_write_leaves_no_order() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;
        ctx.fund(200_00).await?;

        ctx.memory
            .reject_writes_to(product_path(mango.uuid))
            .await;

        let payment = selector_with(&ctx, InstrumentId::StoredBalance).await?;
        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 2)?);
        let writes = ctx.memory.write_count().await;

        let result = ctx.checkout.commit(ctx.buyer, &mut attempt, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Commit(CommitError::Store(StoreError::Rejected(_))))
            ),
            "expected Rejected, got {result:?}"
        );
        assert_eq!(attempt.state(), CheckoutState::Aborted);
        assert_eq!(
            attempt.abort_reason().map(ToString::to_string).as_deref(),
            Some("payment failed, retry")
        );

        assert_eq!(ctx.memory.write_count().await, writes);
        assert!(ctx.orders.list_orders(ctx.buyer).await?.is_empty());
        assert_eq!(
            ctx.balances.get_balance(ctx.buyer).await?,
            TestContext::php(200_00)
        );
        assert_eq!(stock_of(&ctx, &mango).await?, Some(10));
        assert_eq!(ctx.balances.ledger(ctx.buyer).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn retry_after_failed_commit_succeeds() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;
        let mango_path = product_path(mango.uuid);

        ctx.memory.reject_writes_to(mango_path.clone()).await;

        let payment = selector_with(&ctx, InstrumentId::Bank(BankChannel::Maya)).await?;
        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);

        assert!(
            ctx.checkout
                .commit(ctx.buyer, &mut attempt, &payment)
                .await
                .is_err(),
            "first commit should fail"
        );

        ctx.memory.accept_writes_to(&mango_path).await;

        let mut retry = attempt.retry(None)?;
        let confirmation = ctx.checkout.commit(ctx.buyer, &mut retry, &payment).await?;

        assert_eq!(retry.state(), CheckoutState::Committed);
        assert_eq!(ctx.orders.list_orders(ctx.buyer).await?.len(), 1);
        assert_eq!(
            ctx.orders.get_order(confirmation.order).await?.uuid,
            confirmation.order
        );

        Ok(())
    }

    #[tokio::test]
    async fn insufficient_balance_is_rejected_without_touching_store() -> TestResult {
        let mango = Product {
            uuid: harvest::ids::ProductUuid::new(),
            seller: harvest::ids::SellerUuid::new(),
            seller_name: "Dela Cruz Farm".to_string(),
            name: "Carabao Mango".to_string(),
            price: TestContext::php(50_00),
            unit: "kg".to_string(),
            stock: Some(10),
            min_order: 1,
            discount_percent: None,
            image: None,
            bundle: None,
        };

        // No expectations: any store call fails the test.
        let service =
            StoreCheckoutService::new(Arc::new(MockDocumentStore::new()), rusty_money::iso::PHP);

        let mut payment = PaymentSelector::new(TestContext::php(100_00), Vec::new());
        payment.select(InstrumentId::StoredBalance)?;

        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 3)?);

        let result = service.commit(BuyerUuid::new(), &mut attempt, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Attempt(AttemptError::Validation(
                    ValidationError::InsufficientBalance {
                        required: 150_00,
                        available: 100_00,
                    }
                )))
            ),
            "expected InsufficientBalance, got {result:?}"
        );
        assert_eq!(attempt.state(), CheckoutState::Aborted);
        assert_eq!(
            attempt.abort_reason().map(ToString::to_string).as_deref(),
            Some("insufficient balance")
        );

        Ok(())
    }

    #[tokio::test]
    async fn missing_selection_produces_zero_writes() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;
        let payment = ctx.payments.load_selector(ctx.buyer).await?;
        let writes = ctx.memory.write_count().await;

        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);

        let result = ctx.checkout.commit(ctx.buyer, &mut attempt, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Attempt(AttemptError::Validation(
                    ValidationError::NoInstrumentSelected
                )))
            ),
            "expected NoInstrumentSelected, got {result:?}"
        );
        assert_eq!(ctx.memory.write_count().await, writes);
        assert!(matches!(
            attempt.abort_reason(),
            Some(AbortReason::Validation(ValidationError::NoInstrumentSelected))
        ));

        Ok(())
    }

    #[tokio::test]
    async fn repeated_balance_checkouts_never_overdraw() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 60_00, None).await?;
        ctx.fund(100_00).await?;

        let mut committed = 0;

        for _ in 0..3 {
            let payment = selector_with(&ctx, InstrumentId::StoredBalance).await?;
            let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);

            if ctx
                .checkout
                .commit(ctx.buyer, &mut attempt, &payment)
                .await
                .is_ok()
            {
                committed += 1;
            }

            assert!(
                ctx.balances.get_balance(ctx.buyer).await?.to_minor_units() >= 0,
                "balance went negative"
            );
        }

        assert_eq!(committed, 1);
        assert_eq!(
            ctx.balances.get_balance(ctx.buyer).await?,
            TestContext::php(40_00)
        );

        Ok(())
    }

    #[tokio::test]
    async fn balance_spent_after_validation_aborts_commit() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 60_00, None).await?;
        ctx.fund(100_00).await?;

        let first_payment = selector_with(&ctx, InstrumentId::StoredBalance).await?;
        let stale_payment = first_payment.clone();

        let mut first = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);
        ctx.checkout
            .commit(ctx.buyer, &mut first, &first_payment)
            .await?;

        let mut second = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);

        let result = ctx
            .checkout
            .commit(ctx.buyer, &mut second, &stale_payment)
            .await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Commit(CommitError::BalanceChanged {
                    required: 60_00,
                    available: 40_00,
                }))
            ),
            "expected BalanceChanged, got {result:?}"
        );
        assert_eq!(second.state(), CheckoutState::Aborted);
        assert_eq!(ctx.orders.list_orders(ctx.buyer).await?.len(), 1);

        Ok(())
    }

    #[tokio::test]
    async fn stock_sold_after_validation_aborts_commit() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(3)).await?;
        let payment = selector_with(&ctx, InstrumentId::Bank(BankChannel::BankTransfer)).await?;

        let mut first = CheckoutAttempt::new(TestContext::draft(&mango, 2)?);
        ctx.checkout.commit(ctx.buyer, &mut first, &payment).await?;

        // Drafted from the stale snapshot that still shows 3 in stock.
        let mut second = CheckoutAttempt::new(TestContext::draft(&mango, 2)?);

        let result = ctx.checkout.commit(ctx.buyer, &mut second, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Commit(CommitError::StockChanged {
                    available: 1,
                    requested: 2,
                }))
            ),
            "expected StockChanged, got {result:?}"
        );
        assert_eq!(stock_of(&ctx, &mango).await?, Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn deleted_product_aborts_commit() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(3)).await?;
        let payment = selector_with(&ctx, InstrumentId::Bank(BankChannel::GCash)).await?;

        ctx.store
            .delete_document(&product_path(mango.uuid))
            .await?;

        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);

        let result = ctx.checkout.commit(ctx.buyer, &mut attempt, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Commit(CommitError::ProductUnavailable(uuid))) if uuid == mango.uuid
            ),
            "expected ProductUnavailable, got {result:?}"
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_batch_conflict_aborts_attempt() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;
        let stored = ctx
            .memory
            .document(&product_path(mango.uuid))
            .await;

        let mut store = MockDocumentStore::new();

        store
            .expect_get_document()
            .returning(move |_| Ok(stored.clone()));
        store.expect_run_atomic_batch().times(1).returning(|batch| {
            let path = batch
                .preconditions()
                .last()
                .map(|precondition| precondition.path().clone())
                .unwrap_or_else(|| order_path(OrderUuid::new()));

            Err(StoreError::PreconditionFailed(path))
        });

        let service = StoreCheckoutService::new(Arc::new(store), rusty_money::iso::PHP);
        let payment = selector_with(&ctx, InstrumentId::Bank(BankChannel::GCash)).await?;
        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);

        let result = service.commit(ctx.buyer, &mut attempt, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Commit(CommitError::Store(
                    StoreError::PreconditionFailed(_)
                )))
            ),
            "expected PreconditionFailed, got {result:?}"
        );
        assert_eq!(attempt.state(), CheckoutState::Aborted);

        Ok(())
    }

    #[tokio::test]
    async fn timed_out_commit_aborts_without_side_effects() -> TestResult {
        let ctx = TestContext::with_timeout(Duration::from_millis(20));
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;
        let payment = selector_with(&ctx, InstrumentId::Bank(BankChannel::GCash)).await?;
        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);

        ctx.memory
            .set_latency(Some(Duration::from_millis(200)))
            .await;

        let result = ctx.checkout.commit(ctx.buyer, &mut attempt, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Commit(CommitError::Store(StoreError::Timeout(_))))
            ),
            "expected Timeout, got {result:?}"
        );
        assert_eq!(attempt.state(), CheckoutState::Aborted);

        let Some(AbortReason::CommitFailed(cause)) = attempt.abort_reason() else {
            return Err(format!("expected CommitFailed, got {:?}", attempt.abort_reason()).into());
        };

        assert!(
            cause.starts_with("storage error: store call timed out"),
            "cause should keep the store error, got {cause:?}"
        );

        ctx.memory.set_latency(None).await;

        assert!(ctx.orders.list_orders(ctx.buyer).await?.is_empty());
        assert_eq!(stock_of(&ctx, &mango).await?, Some(10));

        Ok(())
    }

    #[tokio::test]
    async fn cancelled_attempt_cannot_commit() -> TestResult {
        let ctx = TestContext::new();
        let mango = ctx.product("Carabao Mango", 40_00, Some(10)).await?;
        let payment = selector_with(&ctx, InstrumentId::Bank(BankChannel::GCash)).await?;
        let mut attempt = CheckoutAttempt::new(TestContext::draft(&mango, 1)?);
        let writes = ctx.memory.write_count().await;

        attempt.cancel()?;

        let result = ctx.checkout.commit(ctx.buyer, &mut attempt, &payment).await;

        assert!(
            matches!(
                result,
                Err(CheckoutError::Attempt(AttemptError::InvalidState(
                    CheckoutState::Aborted
                )))
            ),
            "expected InvalidState, got {result:?}"
        );
        assert_eq!(attempt.abort_reason(), Some(&AbortReason::Cancelled));
        assert_eq!(ctx.memory.write_count().await, writes);

        Ok(())
    }
}
