//! App Context

use std::{sync::Arc, time::Duration};

use rusty_money::iso::Currency;

use crate::{
    config::StoreConfig,
    domain::{
        balances::{BalancesService, StoreBalancesService},
        bundles::{BundlesService, StoreBundlesService},
        carts::{CartsService, StoreCartsService},
        checkout::{CheckoutService, StoreCheckoutService},
        orders::{OrdersService, StoreOrdersService},
        payments::{PaymentsService, StorePaymentsService},
        products::{ProductsService, StoreProductsService},
    },
    store::{BoundedStore, DocumentStore},
};

#[derive(Clone)]
pub struct AppContext {
    pub products: Arc<dyn ProductsService>,
    pub carts: Arc<dyn CartsService>,
    pub bundles: Arc<dyn BundlesService>,
    pub balances: Arc<dyn BalancesService>,
    pub payments: Arc<dyn PaymentsService>,
    pub checkout: Arc<dyn CheckoutService>,
    pub orders: Arc<dyn OrdersService>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build every service over `store`, bounding each store call by the
    /// configured timeout.
    pub fn new<S>(store: S, config: &StoreConfig, currency: &'static Currency) -> Self
    where
        S: DocumentStore + 'static,
    {
        let timeout = Duration::from_millis(config.store_timeout_ms);
        let store: Arc<dyn DocumentStore> = Arc::new(BoundedStore::new(store, timeout));

        let products: Arc<dyn ProductsService> =
            Arc::new(StoreProductsService::new(Arc::clone(&store), currency));
        let balances: Arc<dyn BalancesService> =
            Arc::new(StoreBalancesService::new(Arc::clone(&store), currency));

        Self {
            bundles: Arc::new(StoreBundlesService::new(Arc::clone(&products))),
            payments: Arc::new(StorePaymentsService::new(
                Arc::clone(&store),
                Arc::clone(&balances),
            )),
            carts: Arc::new(StoreCartsService::new(Arc::clone(&store), currency)),
            checkout: Arc::new(StoreCheckoutService::new(Arc::clone(&store), currency)),
            orders: Arc::new(StoreOrdersService::new(store, currency)),
            products,
            balances,
        }
    }
}
