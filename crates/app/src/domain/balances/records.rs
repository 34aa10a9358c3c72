//! Balance Records

use harvest::ids::{BuyerUuid, LedgerEntryUuid, OrderUuid};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::store::{self, Batch, DocumentError, DocumentPath, Precondition};

const CURRENT_BALANCE: &str = "currentBalance";

pub(crate) fn balance_path(buyer: BuyerUuid) -> DocumentPath {
    DocumentPath::root("balances").child(buyer)
}

pub(crate) fn ledger_path(buyer: BuyerUuid) -> DocumentPath {
    balance_path(buyer).child("ledger")
}

/// Balance Record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRecord {
    /// Minor units.
    pub current_balance: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerEntryKind {
    Debit,
    Credit,
}

/// Ledger Entry Record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntryRecord {
    /// Unsigned amount in minor units; `kind` gives the direction.
    pub amount: i64,

    #[serde(rename = "type")]
    pub kind: LedgerEntryKind,
    pub description: String,
    pub created_at: Timestamp,

    #[serde(default)]
    pub order_id: Option<OrderUuid>,

    /// Balance after this entry, in minor units.
    pub new_balance: i64,
}

/// Add a balance change to `batch`: the balance must still read `previous`
/// (or still be absent) when the batch lands, then it is overwritten with the
/// entry's new balance and the entry is appended to the ledger.
pub(crate) fn post_entry(
    batch: Batch,
    buyer: BuyerUuid,
    previous: Option<i64>,
    entry: &LedgerEntryRecord,
) -> Result<Batch, DocumentError> {
    let path = balance_path(buyer);

    let precondition = match previous {
        Some(previous) => Precondition::FieldEquals {
            path: path.clone(),
            field: CURRENT_BALANCE.to_string(),
            value: Value::from(previous),
        },
        None => Precondition::Missing(path.clone()),
    };

    let balance = store::encode(&BalanceRecord {
        current_balance: entry.new_balance,
    })?;

    Ok(batch.require(precondition).set(path, balance).set(
        ledger_path(buyer).child(LedgerEntryUuid::new()),
        store::encode(entry)?,
    ))
}
