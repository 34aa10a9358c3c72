//! Order Models

use harvest::{
    ids::{BuyerUuid, OrderUuid, ProductUuid, SellerUuid},
    orders::{DeliveryOption, OrderStatus, PaymentStatus},
    prices::Price,
};
use jiff::{Timestamp, civil::Date};
use rusty_money::{Money, iso::Currency};

use super::records::OrderRecord;

/// Order Model
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub uuid: OrderUuid,
    pub buyer: BuyerUuid,
    pub product: OrderedProduct,
    pub quantity: u32,
    pub delivery: DeliveryOption,
    pub delivery_date: Date,
    pub subtotal: Price,
    pub discount: Price,
    pub total: Price,
    pub payment_method: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub created_at: Timestamp,
    pub updated_at: Option<Timestamp>,
}

/// OrderedProduct Model
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedProduct {
    pub uuid: ProductUuid,
    pub seller: SellerUuid,
    pub name: String,
    pub price: Price,
    pub unit: String,
    pub stock: Option<u32>,
}

impl Order {
    pub(crate) fn from_record(record: OrderRecord, currency: &'static Currency) -> Self {
        let price = |minor| Money::from_minor(minor, currency);

        Self {
            uuid: record.order_id,
            buyer: record.buyer_id,
            product: OrderedProduct {
                uuid: record.product.product_id,
                seller: record.product.seller_id,
                name: record.product.name,
                price: price(record.product.price),
                unit: record.product.unit,
                stock: record.product.stock,
            },
            quantity: record.quantity,
            delivery: record.delivery_option,
            delivery_date: record.delivery_date,
            subtotal: price(record.subtotal),
            discount: price(record.discount),
            total: price(record.total),
            payment_method: record.payment_method,
            status: record.status,
            payment_status: record.payment_status,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
