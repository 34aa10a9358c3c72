//! Balances Service

use std::sync::Arc;

use async_trait::async_trait;
use harvest::{
    ids::BuyerUuid,
    prices::{self, Price},
};
use jiff::Timestamp;
use mockall::automock;
use rusty_money::{Money, iso::Currency};
use tracing::info;

use crate::{
    domain::balances::{
        BalancesServiceError,
        models::LedgerEntry,
        records::{
            BalanceRecord, LedgerEntryKind, LedgerEntryRecord, balance_path, ledger_path,
            post_entry,
        },
    },
    store::{self, Batch, DocumentStore},
};

#[derive(Clone)]
pub struct StoreBalancesService {
    store: Arc<dyn DocumentStore>,
    currency: &'static Currency,
}

impl StoreBalancesService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, currency: &'static Currency) -> Self {
        Self { store, currency }
    }

    async fn current_minor(&self, buyer: BuyerUuid) -> Result<Option<i64>, BalancesServiceError> {
        let record = self
            .store
            .get_document(&balance_path(buyer))
            .await?
            .map(store::decode::<BalanceRecord>)
            .transpose()?;

        Ok(record.map(|record| record.current_balance))
    }
}

impl std::fmt::Debug for StoreBalancesService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBalancesService")
            .field("currency", &self.currency.iso_alpha_code)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BalancesService for StoreBalancesService {
    #[tracing::instrument(
        name = "balances.service.get_balance",
        skip(self),
        fields(buyer_uuid = %buyer),
        err
    )]
    async fn get_balance(&self, buyer: BuyerUuid) -> Result<Price, BalancesServiceError> {
        let minor = self.current_minor(buyer).await?.unwrap_or(0);

        Ok(Money::from_minor(minor, self.currency))
    }

    #[tracing::instrument(
        name = "balances.service.ledger",
        skip(self),
        fields(buyer_uuid = %buyer),
        err
    )]
    async fn ledger(&self, buyer: BuyerUuid) -> Result<Vec<LedgerEntry>, BalancesServiceError> {
        let documents = self
            .store
            .query_collection(&ledger_path(buyer), &[])
            .await?;

        let mut entries = documents
            .into_iter()
            .map(|document| -> Result<LedgerEntry, BalancesServiceError> {
                let uuid = document.uuid()?;
                let record: LedgerEntryRecord = store::decode(document.data)?;

                Ok(LedgerEntry::from_record(uuid, record, self.currency))
            })
            .collect::<Result<Vec<_>, _>>()?;

        entries.sort_by_key(|entry| (entry.created_at, entry.uuid));

        Ok(entries)
    }

    #[tracing::instrument(
        name = "balances.service.credit",
        skip(self, amount, description),
        fields(buyer_uuid = %buyer, amount = amount.to_minor_units()),
        err
    )]
    async fn credit(
        &self,
        buyer: BuyerUuid,
        amount: Price,
        description: String,
    ) -> Result<Price, BalancesServiceError> {
        prices::ensure_same_currency(&prices::zero(self.currency), &amount)?;

        if amount.to_minor_units() <= 0 {
            return Err(BalancesServiceError::InvalidAmount);
        }

        let previous = self.current_minor(buyer).await?;

        let new_balance = previous
            .unwrap_or(0)
            .checked_add(amount.to_minor_units())
            .ok_or(BalancesServiceError::InvalidAmount)?;

        let entry = LedgerEntryRecord {
            amount: amount.to_minor_units(),
            kind: LedgerEntryKind::Credit,
            description,
            created_at: Timestamp::now(),
            order_id: None,
            new_balance,
        };

        let batch = post_entry(Batch::new(), buyer, previous, &entry)?;

        self.store.run_atomic_batch(batch).await?;

        info!(new_balance, "credited balance");

        Ok(Money::from_minor(new_balance, self.currency))
    }
}

#[automock]
#[async_trait]
pub trait BalancesService: Send + Sync {
    /// Current stored-value balance; zero when the buyer has none yet.
    async fn get_balance(&self, buyer: BuyerUuid) -> Result<Price, BalancesServiceError>;

    /// Ledger entries, oldest first.
    async fn ledger(&self, buyer: BuyerUuid) -> Result<Vec<LedgerEntry>, BalancesServiceError>;

    /// Top up the balance, returning the new balance.
    async fn credit(
        &self,
        buyer: BuyerUuid,
        amount: Price,
        description: String,
    ) -> Result<Price, BalancesServiceError>;
}
