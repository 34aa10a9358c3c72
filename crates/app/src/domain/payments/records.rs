//! Card Records

use harvest::{
    ids::{BuyerUuid, CardUuid},
    payments::SavedCard,
};
use serde::{Deserialize, Serialize};

use crate::store::DocumentPath;

pub(crate) const IS_DEFAULT: &str = "isDefault";

pub(crate) fn cards_path(buyer: BuyerUuid) -> DocumentPath {
    DocumentPath::root("buyers").child(buyer).child("cards")
}

pub(crate) fn card_path(buyer: BuyerUuid, card: CardUuid) -> DocumentPath {
    cards_path(buyer).child(card)
}

/// Card Record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    pub brand: String,
    pub last_four: String,
    pub expiry_month: u8,
    pub expiry_year: u16,

    #[serde(default)]
    pub is_default: bool,
}

impl CardRecord {
    pub(crate) fn into_card(self, uuid: CardUuid) -> SavedCard {
        SavedCard {
            uuid,
            brand: self.brand,
            last_four: self.last_four,
            expiry_month: self.expiry_month,
            expiry_year: self.expiry_year,
            is_default: self.is_default,
        }
    }
}
