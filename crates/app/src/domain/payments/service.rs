//! Payments Service
//!
//! Saved cards and the instrument selector. Changing the default card is
//! submitted as one batch so a buyer never ends up with two defaults or none.

use std::sync::Arc;

use async_trait::async_trait;
use harvest::{
    ids::{BuyerUuid, CardUuid},
    payments::{PaymentSelector, SavedCard},
};
use mockall::automock;
use serde_json::Value;
use tracing::info;

use crate::{
    domain::{
        balances::BalancesService,
        payments::{
            PaymentsServiceError,
            data::NewCard,
            records::{CardRecord, IS_DEFAULT, card_path, cards_path},
        },
    },
    store::{self, Batch, Document, DocumentStore, Precondition},
};

#[derive(Clone)]
pub struct StorePaymentsService {
    store: Arc<dyn DocumentStore>,
    balances: Arc<dyn BalancesService>,
}

impl StorePaymentsService {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, balances: Arc<dyn BalancesService>) -> Self {
        Self { store, balances }
    }
}

impl std::fmt::Debug for StorePaymentsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorePaymentsService").finish_non_exhaustive()
    }
}

fn default_flag(is_default: bool) -> Document {
    Document::from_iter([(IS_DEFAULT.to_string(), Value::Bool(is_default))])
}

/// Clear every other default and set `card` as the default.
fn default_card_batch(batch: Batch, buyer: BuyerUuid, cards: &[SavedCard], card: CardUuid) -> Batch {
    cards
        .iter()
        .filter(|other| other.is_default && other.uuid != card)
        .fold(batch, |batch, other| {
            batch.update(card_path(buyer, other.uuid), default_flag(false))
        })
}

#[async_trait]
impl PaymentsService for StorePaymentsService {
    #[tracing::instrument(
        name = "payments.service.list_cards",
        skip(self),
        fields(buyer_uuid = %buyer),
        err
    )]
    async fn list_cards(&self, buyer: BuyerUuid) -> Result<Vec<SavedCard>, PaymentsServiceError> {
        let documents = self
            .store
            .query_collection(&cards_path(buyer), &[])
            .await?;

        documents
            .into_iter()
            .map(|document| -> Result<SavedCard, PaymentsServiceError> {
                let uuid = document.uuid()?;
                let record: CardRecord = store::decode(document.data)?;

                Ok(record.into_card(uuid))
            })
            .collect()
    }

    #[tracing::instrument(
        name = "payments.service.add_card",
        skip(self, card),
        fields(buyer_uuid = %buyer, card_uuid = tracing::field::Empty),
        err
    )]
    async fn add_card(
        &self,
        buyer: BuyerUuid,
        card: NewCard,
    ) -> Result<SavedCard, PaymentsServiceError> {
        if !card.is_well_formed() {
            return Err(PaymentsServiceError::InvalidCard);
        }

        let existing = self.list_cards(buyer).await?;
        let uuid = CardUuid::new();
        let is_default = card.make_default || existing.is_empty();

        tracing::Span::current().record("card_uuid", tracing::field::display(uuid));

        let record = CardRecord {
            brand: card.brand,
            last_four: card.last_four,
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            is_default,
        };

        let mut batch = Batch::new().require(Precondition::Missing(card_path(buyer, uuid)));

        if is_default {
            batch = default_card_batch(batch, buyer, &existing, uuid);
        }

        let batch = batch.set(card_path(buyer, uuid), store::encode(&record)?);

        self.store.run_atomic_batch(batch).await?;

        info!(is_default, "added card");

        Ok(record.into_card(uuid))
    }

    #[tracing::instrument(
        name = "payments.service.set_default_card",
        skip(self),
        fields(buyer_uuid = %buyer, card_uuid = %card),
        err
    )]
    async fn set_default_card(
        &self,
        buyer: BuyerUuid,
        card: CardUuid,
    ) -> Result<(), PaymentsServiceError> {
        let cards = self.list_cards(buyer).await?;

        if !cards.iter().any(|saved| saved.uuid == card) {
            return Err(PaymentsServiceError::CardNotFound);
        }

        let batch = Batch::new().require(Precondition::Exists(card_path(buyer, card)));
        let batch = default_card_batch(batch, buyer, &cards, card)
            .update(card_path(buyer, card), default_flag(true));

        self.store.run_atomic_batch(batch).await?;

        info!("set default card");

        Ok(())
    }

    #[tracing::instrument(
        name = "payments.service.load_selector",
        skip(self),
        fields(buyer_uuid = %buyer),
        err
    )]
    async fn load_selector(
        &self,
        buyer: BuyerUuid,
    ) -> Result<PaymentSelector, PaymentsServiceError> {
        let balance = self.balances.get_balance(buyer).await?;
        let cards = self.list_cards(buyer).await?;

        Ok(PaymentSelector::new(balance, cards))
    }
}

#[automock]
#[async_trait]
pub trait PaymentsService: Send + Sync {
    /// The buyer's saved cards.
    async fn list_cards(&self, buyer: BuyerUuid) -> Result<Vec<SavedCard>, PaymentsServiceError>;

    /// Save a tokenized card.
    async fn add_card(
        &self,
        buyer: BuyerUuid,
        card: NewCard,
    ) -> Result<SavedCard, PaymentsServiceError>;

    /// Make `card` the only default card.
    async fn set_default_card(
        &self,
        buyer: BuyerUuid,
        card: CardUuid,
    ) -> Result<(), PaymentsServiceError>;

    /// Instruments on offer with the live balance. Nothing is selected.
    async fn load_selector(
        &self,
        buyer: BuyerUuid,
    ) -> Result<PaymentSelector, PaymentsServiceError>;
}
