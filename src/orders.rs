//! Orders

use std::fmt;

use jiff::civil::Date;
use rusty_money::Money;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::CartLineItem,
    ids::{ProductUuid, SellerUuid},
    prices::{self, Price, PriceError},
};

/// Errors raised while drafting or transitioning orders.
#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    /// Orders need at least one unit.
    #[error("order quantity must be at least one")]
    ZeroQuantity,

    /// The cart line refers to a different product than the snapshot.
    #[error("cart line is for product {line}, but snapshot is for product {snapshot}")]
    ProductMismatch {
        /// Product on the cart line.
        line: ProductUuid,
        /// Product in the snapshot.
        snapshot: ProductUuid,
    },

    /// The requested lifecycle transition is not allowed.
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// Wrapped price arithmetic error.
    #[error(transparent)]
    Price(#[from] PriceError),
}

/// Fulfillment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Paid and waiting on the seller.
    Processing,

    /// Packed and ready for pickup or dispatch.
    Ready,

    /// Cancelled before delivery.
    Cancelled,

    /// Handed over to the buyer.
    Delivered,
}

impl OrderStatus {
    /// Whether the lifecycle allows moving to `next`.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (Self::Processing, Self::Ready | Self::Cancelled)
                | (Self::Ready, Self::Delivered | Self::Cancelled)
        )
    }

    /// Whether no further transitions are possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Delivered)
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::InvalidTransition`] when the lifecycle forbids it.
    pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus, OrderError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrderError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Processing => "processing",
            Self::Ready => "ready",
            Self::Cancelled => "cancelled",
            Self::Delivered => "delivered",
        };

        f.write_str(label)
    }
}

/// Payment state recorded with an order. Checkout only records paid orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Payment captured at checkout.
    Paid,
}

/// How the buyer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryOption {
    /// Buyer collects from the farm.
    Pickup,

    /// Seller delivers to the buyer.
    Delivery,
}

/// The product as it was when the order was drafted.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSnapshot {
    /// Product id.
    pub uuid: ProductUuid,

    /// Seller offering the product.
    pub seller: SellerUuid,

    /// Display name.
    pub name: String,

    /// Unit price.
    pub price: Price,

    /// Selling unit, e.g. "kg".
    pub unit: String,

    /// Units in stock, when the product tracks stock.
    pub stock: Option<u32>,

    /// Smallest quantity the seller accepts.
    pub min_order: u32,

    /// Product or bundle discount in whole points.
    pub discount_percent: Option<u32>,
}

/// An order assembled from one cart line or a buy-now product.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    product: ProductSnapshot,
    quantity: u32,
    delivery: DeliveryOption,
    delivery_date: Date,
    subtotal: Price,
    discount: Price,
    total: Price,
}

impl OrderDraft {
    /// Draft an order and compute its totals.
    ///
    /// `subtotal = price × quantity`, `discount = subtotal × percent / 100`,
    /// `total = subtotal − discount`.
    ///
    /// # Errors
    ///
    /// Returns an [`OrderError`] for a zero quantity or on arithmetic overflow.
    pub fn new(
        product: ProductSnapshot,
        quantity: u32,
        delivery: DeliveryOption,
        delivery_date: Date,
    ) -> Result<Self, OrderError> {
        if quantity == 0 {
            return Err(OrderError::ZeroQuantity);
        }

        let subtotal = prices::line_total(product.price, quantity)?;

        let discount = match product.discount_percent {
            Some(percent) => prices::percent_of(subtotal, percent.min(100))?,
            None => prices::zero(subtotal.currency()),
        };

        let total = Money::from_minor(
            subtotal.to_minor_units() - discount.to_minor_units(),
            subtotal.currency(),
        );

        Ok(Self {
            product,
            quantity,
            delivery,
            delivery_date,
            subtotal,
            discount,
            total,
        })
    }

    /// Draft an order for a cart line, using the line's quantity.
    ///
    /// # Errors
    ///
    /// Returns [`OrderError::ProductMismatch`] if the line and snapshot disagree.
    pub fn for_cart_line(
        product: ProductSnapshot,
        line: &CartLineItem,
        delivery: DeliveryOption,
        delivery_date: Date,
    ) -> Result<Self, OrderError> {
        if line.product != product.uuid {
            return Err(OrderError::ProductMismatch {
                line: line.product,
                snapshot: product.uuid,
            });
        }

        Self::new(product, line.quantity, delivery, delivery_date)
    }

    /// Product snapshot.
    pub fn product(&self) -> &ProductSnapshot {
        &self.product
    }

    /// Units ordered.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Delivery option.
    pub fn delivery(&self) -> DeliveryOption {
        self.delivery
    }

    /// Requested delivery or pickup date.
    pub fn delivery_date(&self) -> Date {
        self.delivery_date
    }

    /// Price before discount.
    pub fn subtotal(&self) -> Price {
        self.subtotal
    }

    /// Discount amount.
    pub fn discount(&self) -> Price {
        self.discount
    }

    /// Amount charged.
    pub fn total(&self) -> Price {
        self.total
    }
}
