//! Product Models

use harvest::{
    bundles::{Bundle, BundleComponent},
    cart::CartLineItem,
    ids::{ProductUuid, SellerUuid},
    orders::ProductSnapshot,
    prices::Price,
};
use rusty_money::{Money, iso::Currency};
use smallvec::SmallVec;

use super::records::{BundleItemRecord, ProductRecord};

/// Product Model
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub uuid: ProductUuid,
    pub seller: SellerUuid,
    pub seller_name: String,
    pub name: String,
    pub price: Price,
    pub unit: String,
    pub stock: Option<u32>,
    pub min_order: u32,
    pub discount_percent: Option<u32>,
    pub image: Option<String>,

    /// Constituents, when the product is a bundle.
    pub bundle: Option<SmallVec<[BundleComponent; 4]>>,
}

impl Product {
    pub(crate) fn from_record(
        uuid: ProductUuid,
        record: ProductRecord,
        currency: &'static Currency,
    ) -> Self {
        let bundle = record.is_bundled.then(|| {
            record
                .bundle_items
                .iter()
                .map(|item| BundleComponent {
                    product: item.product_id,
                    quantity: item.quantity,
                })
                .collect()
        });

        Self {
            uuid,
            seller: record.seller_id,
            seller_name: record.seller_name,
            name: record.name,
            price: Money::from_minor(record.price, currency),
            unit: record.unit,
            stock: record.stock,
            min_order: record.min_order,
            discount_percent: record.discount_percent,
            image: record.image_ref,
            bundle,
        }
    }

    pub(crate) fn to_record(&self) -> ProductRecord {
        ProductRecord {
            seller_id: self.seller,
            seller_name: self.seller_name.clone(),
            name: self.name.clone(),
            price: self.price.to_minor_units(),
            unit: self.unit.clone(),
            stock: self.stock,
            min_order: self.min_order,
            discount_percent: self.discount_percent,
            image_ref: self.image.clone(),
            is_bundled: self.bundle.is_some(),
            bundle_items: self
                .bundle
                .iter()
                .flatten()
                .map(|component| BundleItemRecord {
                    product_id: component.product,
                    quantity: component.quantity,
                })
                .collect(),
        }
    }

    /// The bundle offer, when this product is one.
    pub fn as_bundle(&self) -> Option<Bundle> {
        self.bundle.as_ref().map(|components| Bundle {
            product: self.uuid,
            price: self.price,
            components: components.clone(),
        })
    }

    /// Snapshot recorded on orders.
    pub fn snapshot(&self) -> ProductSnapshot {
        ProductSnapshot {
            uuid: self.uuid,
            seller: self.seller,
            name: self.name.clone(),
            price: self.price,
            unit: self.unit.clone(),
            stock: self.stock,
            min_order: self.min_order,
            discount_percent: self.discount_percent,
        }
    }

    /// A cart line for `quantity` units of this product.
    pub fn cart_line(&self, quantity: u32) -> CartLineItem {
        let line = CartLineItem::new(
            self.seller,
            self.seller_name.clone(),
            self.uuid,
            self.name.clone(),
            self.price,
            quantity,
        );

        match &self.image {
            Some(image) => line.with_image(image.clone()),
            None => line,
        }
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso;
    use smallvec::smallvec;

    use super::*;

    fn mango() -> Product {
        Product {
            uuid: ProductUuid::new(),
            seller: SellerUuid::new(),
            seller_name: "Dela Cruz Farm".to_string(),
            name: "Carabao Mango".to_string(),
            price: Money::from_minor(40_00, iso::PHP),
            unit: "kg".to_string(),
            stock: Some(12),
            min_order: 1,
            discount_percent: None,
            image: Some("images/mango.jpg".to_string()),
            bundle: None,
        }
    }

    #[test]
    fn record_conversion_keeps_fields() {
        let product = mango();

        let restored = Product::from_record(product.uuid, product.to_record(), iso::PHP);

        assert_eq!(restored, product);
    }

    #[test]
    fn bundle_components_survive_records() {
        let component = BundleComponent {
            product: ProductUuid::new(),
            quantity: 2,
        };
        let product = Product {
            bundle: Some(smallvec![component]),
            ..mango()
        };

        let record = product.to_record();

        assert!(record.is_bundled);
        assert_eq!(
            Product::from_record(product.uuid, record, iso::PHP)
                .as_bundle()
                .map(|bundle| bundle.components.into_vec()),
            Some(vec![component])
        );
    }

    #[test]
    fn cart_line_carries_seller_and_image() {
        let product = mango();

        let line = product.cart_line(3);

        assert_eq!(line.seller, product.seller);
        assert_eq!(line.quantity, 3);
        assert_eq!(line.image.as_deref(), Some("images/mango.jpg"));
        assert!(!line.selected);
    }
}
