//! Balance Models

use harvest::{
    ids::{LedgerEntryUuid, OrderUuid},
    prices::Price,
};
use jiff::Timestamp;
use rusty_money::{Money, iso::Currency};

use super::records::{LedgerEntryKind, LedgerEntryRecord};

/// Ledger Entry Model
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerEntry {
    pub uuid: LedgerEntryUuid,
    pub kind: LedgerEntryKind,
    pub amount: Price,
    pub description: String,
    pub created_at: Timestamp,
    pub order: Option<OrderUuid>,
    pub new_balance: Price,
}

impl LedgerEntry {
    pub(crate) fn from_record(
        uuid: LedgerEntryUuid,
        record: LedgerEntryRecord,
        currency: &'static Currency,
    ) -> Self {
        Self {
            uuid,
            kind: record.kind,
            amount: Money::from_minor(record.amount, currency),
            description: record.description,
            created_at: record.created_at,
            order: record.order_id,
            new_balance: Money::from_minor(record.new_balance, currency),
        }
    }
}
