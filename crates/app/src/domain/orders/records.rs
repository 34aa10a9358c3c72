//! Order Records

use harvest::{
    ids::{BuyerUuid, OrderUuid, ProductUuid, SellerUuid},
    orders::{DeliveryOption, OrderDraft, OrderStatus, PaymentStatus},
};
use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use crate::store::DocumentPath;

pub(crate) const STATUS: &str = "status";

pub(crate) fn orders_path() -> DocumentPath {
    DocumentPath::root("orders")
}

pub(crate) fn order_path(order: OrderUuid) -> DocumentPath {
    orders_path().child(order)
}

/// Order Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    pub order_id: OrderUuid,
    pub buyer_id: BuyerUuid,
    pub product: OrderedProductRecord,
    pub quantity: u32,
    pub delivery_option: DeliveryOption,
    pub delivery_date: Date,

    /// Minor units.
    pub subtotal: i64,
    pub discount: i64,
    pub total: i64,

    pub payment_method: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: Timestamp,

    #[serde(default)]
    pub updated_at: Option<Timestamp>,
}

/// Product snapshot stored on an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderedProductRecord {
    pub product_id: ProductUuid,
    pub seller_id: SellerUuid,
    pub name: String,

    /// Unit price in minor units.
    pub price: i64,
    pub unit: String,

    /// Stock when the order was placed.
    #[serde(default)]
    pub stock: Option<u32>,
}

impl OrderRecord {
    /// A freshly paid order in `processing`.
    pub(crate) fn paid(
        order: OrderUuid,
        buyer: BuyerUuid,
        draft: &OrderDraft,
        payment_method: String,
        created_at: Timestamp,
    ) -> Self {
        let product = draft.product();

        Self {
            order_id: order,
            buyer_id: buyer,
            product: OrderedProductRecord {
                product_id: product.uuid,
                seller_id: product.seller,
                name: product.name.clone(),
                price: product.price.to_minor_units(),
                unit: product.unit.clone(),
                stock: product.stock,
            },
            quantity: draft.quantity(),
            delivery_option: draft.delivery(),
            delivery_date: draft.delivery_date(),
            subtotal: draft.subtotal().to_minor_units(),
            discount: draft.discount().to_minor_units(),
            total: draft.total().to_minor_units(),
            payment_method,
            status: OrderStatus::Processing,
            payment_status: PaymentStatus::Paid,
            created_at,
            updated_at: None,
        }
    }
}

/// Fields written by a status transition.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StatusUpdate {
    pub status: OrderStatus,
    pub updated_at: Timestamp,
}
