//! Product Records

use harvest::ids::{ProductUuid, SellerUuid};
use serde::{Deserialize, Serialize};

use crate::store::DocumentPath;

pub(crate) const STOCK: &str = "stock";

pub(crate) fn product_path(product: ProductUuid) -> DocumentPath {
    DocumentPath::root("products").child(product)
}

/// Product Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub seller_id: SellerUuid,
    pub seller_name: String,
    pub name: String,

    /// Unit price in minor units.
    pub price: i64,
    pub unit: String,

    #[serde(default)]
    pub stock: Option<u32>,

    #[serde(default = "default_min_order")]
    pub min_order: u32,

    #[serde(default)]
    pub discount_percent: Option<u32>,

    #[serde(default)]
    pub image_ref: Option<String>,

    #[serde(default)]
    pub is_bundled: bool,

    #[serde(default)]
    pub bundle_items: Vec<BundleItemRecord>,
}

/// Bundle constituent reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleItemRecord {
    pub product_id: ProductUuid,
    pub quantity: u32,
}

const fn default_min_order() -> u32 {
    1
}
