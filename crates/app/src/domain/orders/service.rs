//! Orders Service
//!
//! Reads orders and moves them through the fulfillment lifecycle. A status
//! change only lands if the stored status is still the one it was read as.

use std::sync::Arc;

use async_trait::async_trait;
use harvest::{
    ids::{BuyerUuid, OrderUuid},
    orders::OrderStatus,
};
use jiff::Timestamp;
use mockall::automock;
use rusty_money::iso::Currency;
use serde_json::Value;
use tracing::info;

use crate::{
    domain::orders::{
        OrdersServiceError,
        models::Order,
        records::{OrderRecord, STATUS, StatusUpdate, order_path, orders_path},
    },
    store::{self, Batch, DocumentStore, Precondition, Predicate},
};

#[derive(Clone)]
pub struct StoreOrdersService {
    store: Arc<dyn DocumentStore>,
    currency: &'static Currency,
}

impl StoreOrdersService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, currency: &'static Currency) -> Self {
        Self { store, currency }
    }
}

impl std::fmt::Debug for StoreOrdersService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOrdersService")
            .field("currency", &self.currency.iso_alpha_code)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl OrdersService for StoreOrdersService {
    #[tracing::instrument(
        name = "orders.service.get_order",
        skip(self),
        fields(order_uuid = %order),
        err
    )]
    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError> {
        let document = self
            .store
            .get_document(&order_path(order))
            .await?
            .ok_or(OrdersServiceError::NotFound)?;

        let record: OrderRecord = store::decode(document)?;

        Ok(Order::from_record(record, self.currency))
    }

    #[tracing::instrument(
        name = "orders.service.list_orders",
        skip(self),
        fields(buyer_uuid = %buyer),
        err
    )]
    async fn list_orders(&self, buyer: BuyerUuid) -> Result<Vec<Order>, OrdersServiceError> {
        let documents = self
            .store
            .query_collection(
                &orders_path(),
                &[Predicate::equals("buyerId", buyer.to_string())],
            )
            .await?;

        let mut orders = documents
            .into_iter()
            .map(|document| -> Result<Order, OrdersServiceError> {
                let record: OrderRecord = store::decode(document.data)?;

                Ok(Order::from_record(record, self.currency))
            })
            .collect::<Result<Vec<_>, _>>()?;

        orders.sort_by(|a, b| (b.created_at, b.uuid).cmp(&(a.created_at, a.uuid)));

        Ok(orders)
    }

    #[tracing::instrument(
        name = "orders.service.advance_status",
        skip(self),
        fields(order_uuid = %order, next = %next),
        err
    )]
    async fn advance_status(
        &self,
        order: OrderUuid,
        next: OrderStatus,
    ) -> Result<Order, OrdersServiceError> {
        let mut current = self.get_order(order).await?;
        let status = current.status.transition_to(next)?;
        let updated_at = Timestamp::now();

        let batch = Batch::new()
            .require(Precondition::FieldEquals {
                path: order_path(order),
                field: STATUS.to_string(),
                value: Value::from(current.status.to_string()),
            })
            .update(
                order_path(order),
                store::encode(&StatusUpdate { status, updated_at })?,
            );

        self.store.run_atomic_batch(batch).await?;

        info!(from = %current.status, to = %status, "advanced order status");

        current.status = status;
        current.updated_at = Some(updated_at);

        Ok(current)
    }
}

#[automock]
#[async_trait]
pub trait OrdersService: Send + Sync {
    /// Retrieve a single order.
    async fn get_order(&self, order: OrderUuid) -> Result<Order, OrdersServiceError>;

    /// The buyer's orders, newest first.
    async fn list_orders(&self, buyer: BuyerUuid) -> Result<Vec<Order>, OrdersServiceError>;

    /// Move an order to `next` if the lifecycle allows it.
    async fn advance_status(
        &self,
        order: OrderUuid,
        next: OrderStatus,
    ) -> Result<Order, OrdersServiceError>;
}

#[cfg(test)]
mod tests {
    use harvest::orders::OrderError;
    use testresult::TestResult;

    use crate::{
        store::{MockDocumentStore, StoreError},
        test::TestContext,
    };

    use super::*;

    #[tokio::test]
    async fn get_order_unknown_uuid_returns_not_found() {
        let ctx = TestContext::new();

        let result = ctx.orders.get_order(OrderUuid::new()).await;

        assert!(
            matches!(result, Err(OrdersServiceError::NotFound)),
            "expected NotFound, got {result:?}"
        );
    }

    #[tokio::test]
    async fn list_orders_returns_only_buyers_orders_newest_first() -> TestResult {
        let ctx = TestContext::new();

        let older = ctx.seed_order(ctx.buyer).await?;
        let newer = ctx.seed_order(ctx.buyer).await?;
        ctx.seed_order(BuyerUuid::new()).await?;

        let orders = ctx.orders.list_orders(ctx.buyer).await?;
        let uuids: Vec<OrderUuid> = orders.iter().map(|order| order.uuid).collect();

        assert_eq!(uuids, vec![newer, older]);

        Ok(())
    }

    #[tokio::test]
    async fn advance_status_follows_lifecycle() -> TestResult {
        let ctx = TestContext::new();
        let order = ctx.seed_order(ctx.buyer).await?;

        let ready = ctx.orders.advance_status(order, OrderStatus::Ready).await?;
        let delivered = ctx
            .orders
            .advance_status(order, OrderStatus::Delivered)
            .await?;

        assert_eq!(ready.status, OrderStatus::Ready);
        assert_eq!(delivered.status, OrderStatus::Delivered);
        assert_eq!(
            ctx.orders.get_order(order).await?.status,
            OrderStatus::Delivered
        );

        Ok(())
    }

    #[tokio::test]
    async fn advance_status_rejects_skipping_ready() -> TestResult {
        let ctx = TestContext::new();
        let order = ctx.seed_order(ctx.buyer).await?;

        let result = ctx
            .orders
            .advance_status(order, OrderStatus::Delivered)
            .await;

        assert!(
            matches!(
                result,
                Err(OrdersServiceError::Transition(
                    OrderError::InvalidTransition { .. }
                ))
            ),
            "expected InvalidTransition, got {result:?}"
        );
        assert_eq!(
            ctx.orders.get_order(order).await?.status,
            OrderStatus::Processing
        );

        Ok(())
    }

    #[tokio::test]
    async fn concurrent_status_change_is_a_conflict() -> TestResult {
        let ctx = TestContext::new();
        let order = ctx.seed_order(ctx.buyer).await?;
        let stored = ctx.memory.document(&order_path(order)).await;

        let mut store = MockDocumentStore::new();

        store
            .expect_get_document()
            .returning(move |_| Ok(stored.clone()));
        store
            .expect_run_atomic_batch()
            .returning(|batch| match batch.preconditions().first() {
                Some(precondition) => {
                    Err(StoreError::PreconditionFailed(precondition.path().clone()))
                }
                None => Ok(()),
            });

        let service = StoreOrdersService::new(Arc::new(store), rusty_money::iso::PHP);

        let result = service.advance_status(order, OrderStatus::Cancelled).await;

        assert!(
            matches!(result, Err(OrdersServiceError::Conflict)),
            "expected Conflict, got {result:?}"
        );

        Ok(())
    }
}
