use clap::Args;
use harvest::prelude::*;
use harvest_app::{
    config::{LoggingConfig, StoreConfig},
    context::AppContext,
    domain::{
        carts::CartSession,
        checkout::{LogPresenter, checkout_and_present},
        payments::data::NewCard,
        products::models::Product,
    },
    observability,
    store::MemoryDocumentStore,
};
use jiff::{ToSpan, Zoned};
use rusty_money::{Money, iso};
use tracing::info;

#[derive(Debug, Args)]
pub(crate) struct DemoArgs {
    #[command(flatten)]
    store: StoreConfig,

    #[command(flatten)]
    logging: LoggingConfig,

    /// Opening balance in centavos
    #[arg(long, default_value_t = 500_00)]
    balance: i64,

    /// Pay with the default card instead of the balance
    #[arg(long)]
    card: bool,
}

pub(crate) async fn run(args: DemoArgs) -> Result<(), String> {
    observability::init_subscriber(&args.logging)
        .map_err(|error| format!("failed to initialise logging: {error}"))?;

    let app = AppContext::new(MemoryDocumentStore::new(), &args.store, iso::PHP);
    let buyer = BuyerUuid::new();
    let seller = SellerUuid::new();

    let mango = put_product(&app, seller, "Carabao Mango", 40_00, Some(25)).await?;
    let rice = put_product(&app, seller, "Dinorado Rice", 80_00, Some(10)).await?;

    let mut bundle = put_product(&app, seller, "Harvest Box", 120_00, None).await?;
    bundle.bundle = Some(
        [
            BundleComponent {
                product: mango.uuid,
                quantity: 2,
            },
            BundleComponent {
                product: rice.uuid,
                quantity: 1,
            },
        ]
        .into_iter()
        .collect(),
    );
    let bundle = app
        .products
        .put_product(bundle)
        .await
        .map_err(|error| format!("failed to store bundle: {error}"))?;

    let pricing = app
        .bundles
        .resolve_product(bundle.uuid)
        .await
        .map_err(|error| format!("failed to price bundle: {error}"))?;

    info!(
        original_total = %pricing.original_total,
        bundle_price = %pricing.bundle_price,
        discount_percent = pricing.discount_percent,
        "bundle priced"
    );

    if args.balance > 0 {
        app.balances
            .credit(buyer, Money::from_minor(args.balance, iso::PHP), "Top up".to_string())
            .await
            .map_err(|error| format!("failed to fund balance: {error}"))?;
    }

    app.payments
        .add_card(
            buyer,
            NewCard {
                brand: "Visa".to_string(),
                last_four: "4242".to_string(),
                expiry_month: 8,
                expiry_year: 2029,
                make_default: true,
            },
        )
        .await
        .map_err(|error| format!("failed to save card: {error}"))?;

    let mut session = CartSession::open(std::sync::Arc::clone(&app.carts), buyer)
        .await
        .map_err(|error| format!("failed to open cart: {error}"))?;

    session
        .add_item(mango.cart_line(2))
        .await
        .map_err(|error| format!("failed to add to cart: {error}"))?;
    session
        .merge_incoming_line(mango.cart_line(1))
        .await
        .map_err(|error| format!("failed to add to cart: {error}"))?;

    let line = session
        .cart()
        .item(seller, mango.uuid)
        .cloned()
        .ok_or_else(|| "cart line went missing".to_string())?;

    info!(
        quantity = line.quantity,
        line_total = %line.line_total(),
        "cart ready"
    );

    let delivery_date = Zoned::now()
        .checked_add(3.days())
        .map_err(|error| format!("failed to pick a delivery date: {error}"))?
        .date();

    let draft = OrderDraft::for_cart_line(
        mango.snapshot(),
        &line,
        DeliveryOption::Pickup,
        delivery_date,
    )
    .map_err(|error| format!("failed to draft order: {error}"))?;

    let mut selector = app
        .payments
        .load_selector(buyer)
        .await
        .map_err(|error| format!("failed to load payment options: {error}"))?;

    if args.card {
        selector.select_default_card();
    } else {
        selector
            .select(InstrumentId::StoredBalance)
            .map_err(|error| error.to_string())?;
    }

    let mut attempt = CheckoutAttempt::new(draft);

    let confirmation = checkout_and_present(
        app.checkout.as_ref(),
        &LogPresenter,
        buyer,
        &mut attempt,
        &selector,
    )
    .await
    .map_err(|error| error.to_string())?;

    session.remove_item(seller, mango.uuid).await;

    let order = app
        .orders
        .advance_status(confirmation.order, OrderStatus::Ready)
        .await
        .map_err(|error| format!("failed to update order: {error}"))?;

    let balance = app
        .balances
        .get_balance(buyer)
        .await
        .map_err(|error| format!("failed to read balance: {error}"))?;

    info!(
        order_uuid = %order.uuid,
        status = %order.status,
        %balance,
        cart_lines = session.cart().line_count(),
        "demo finished"
    );

    Ok(())
}

async fn put_product(
    app: &AppContext,
    seller: SellerUuid,
    name: &str,
    price: i64,
    stock: Option<u32>,
) -> Result<Product, String> {
    app.products
        .put_product(Product {
            uuid: ProductUuid::new(),
            seller,
            seller_name: "Dela Cruz Farm".to_string(),
            name: name.to_string(),
            price: Money::from_minor(price, iso::PHP),
            unit: "kg".to_string(),
            stock,
            min_order: 1,
            discount_percent: None,
            image: None,
            bundle: None,
        })
        .await
        .map_err(|error| format!("failed to store {name}: {error}"))
}
