//! Cart Records
//!
//! The cart document is a flat list of lines; seller groups are rebuilt on
//! load. Selection is local state and is never written.

use harvest::{
    cart::CartLineItem,
    ids::{BuyerUuid, ProductUuid, SellerUuid},
};
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};

use crate::store::DocumentPath;

pub(crate) fn cart_path(buyer: BuyerUuid) -> DocumentPath {
    DocumentPath::root("carts").child(buyer)
}

/// Cart Document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartDocument {
    #[serde(default)]
    pub items: Vec<CartItemRecord>,
}

/// CartItem Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRecord {
    pub seller_id: SellerUuid,
    pub seller_name: String,
    pub product_id: ProductUuid,
    pub product_name: String,

    /// Unit price in minor units.
    pub price: i64,
    pub quantity: u32,

    #[serde(default)]
    pub image_ref: Option<String>,
}

impl CartItemRecord {
    pub(crate) fn from_line(line: &CartLineItem) -> Self {
        Self {
            seller_id: line.seller,
            seller_name: line.seller_name.clone(),
            product_id: line.product,
            product_name: line.name.clone(),
            price: line.price.to_minor_units(),
            quantity: line.quantity,
            image_ref: line.image.clone(),
        }
    }

    pub(crate) fn into_line(self, currency: &'static Currency) -> CartLineItem {
        let line = CartLineItem::new(
            self.seller_id,
            self.seller_name,
            self.product_id,
            self.product_name,
            Money::from_minor(self.price, currency),
            self.quantity,
        );

        match self.image_ref {
            Some(image) => line.with_image(image),
            None => line,
        }
    }
}
