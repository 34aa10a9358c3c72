//! Payment Instruments
//!
//! The buyer picks exactly one instrument per checkout: the stored-value
//! balance, a saved card, or one of the fixed bank and e-wallet channels.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ids::CardUuid, prices::Price};

/// Errors related to instrument selection.
#[derive(Debug, Error, PartialEq)]
pub enum PaymentError {
    /// The requested instrument is not offered to this buyer.
    #[error("payment instrument {0} is not available")]
    UnknownInstrument(InstrumentId),
}

/// Bank transfer and e-wallet channels offered to every buyer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BankChannel {
    /// `GCash` e-wallet.
    GCash,

    /// Maya e-wallet.
    Maya,

    /// Direct bank transfer.
    BankTransfer,
}

impl BankChannel {
    /// Every channel, in display order.
    pub const ALL: [BankChannel; 3] = [Self::GCash, Self::Maya, Self::BankTransfer];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::GCash => "GCash",
            Self::Maya => "Maya",
            Self::BankTransfer => "Bank Transfer",
        }
    }
}

/// A tokenized card saved by the buyer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedCard {
    /// Card id.
    pub uuid: CardUuid,

    /// Card brand, e.g. "Visa".
    pub brand: String,

    /// Last four digits of the card number.
    pub last_four: String,

    /// Expiry month, 1–12.
    pub expiry_month: u8,

    /// Four-digit expiry year.
    pub expiry_year: u16,

    /// Whether this is the buyer's default card.
    pub is_default: bool,
}

impl SavedCard {
    /// Masked card number, e.g. `•••• 4242`.
    pub fn masked_number(&self) -> String {
        format!("•••• {}", self.last_four)
    }
}

/// Identifies an instrument independently of its live data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstrumentId {
    /// The stored-value balance.
    StoredBalance,

    /// A saved card.
    Card(CardUuid),

    /// A bank or e-wallet channel.
    Bank(BankChannel),
}

impl fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StoredBalance => f.write_str("stored balance"),
            Self::Card(uuid) => write!(f, "card {uuid}"),
            Self::Bank(channel) => f.write_str(channel.label()),
        }
    }
}

/// A usable payment instrument.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentInstrument {
    /// Internal prepaid balance, with its live amount.
    StoredBalance {
        /// Balance as last loaded.
        balance: Price,
    },

    /// Saved card.
    Card(SavedCard),

    /// Bank transfer or e-wallet placeholder.
    Bank(BankChannel),
}

impl PaymentInstrument {
    /// Instrument identity.
    pub fn id(&self) -> InstrumentId {
        match self {
            Self::StoredBalance { .. } => InstrumentId::StoredBalance,
            Self::Card(card) => InstrumentId::Card(card.uuid),
            Self::Bank(channel) => InstrumentId::Bank(*channel),
        }
    }

    /// Display label used on receipts and confirmations.
    pub fn label(&self) -> String {
        match self {
            Self::StoredBalance { .. } => "Wallet Balance".to_string(),
            Self::Card(card) => format!("{} {}", card.brand, card.masked_number()),
            Self::Bank(channel) => channel.label().to_string(),
        }
    }

    /// Whether this is the stored-value balance.
    pub fn is_stored_balance(&self) -> bool {
        matches!(self, Self::StoredBalance { .. })
    }

    /// Whether the instrument can pay `total`. Only the balance is checked;
    /// it must cover the total in the same currency.
    pub fn is_valid(&self, total: Price) -> bool {
        match self {
            Self::StoredBalance { balance } => {
                balance.currency() == total.currency()
                    && balance.to_minor_units() >= total.to_minor_units()
            }
            Self::Card(_) | Self::Bank(_) => true,
        }
    }
}

/// The instruments on offer plus the buyer's single selection.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentSelector {
    instruments: Vec<PaymentInstrument>,
    selected: Option<InstrumentId>,
}

impl PaymentSelector {
    /// Offer the balance, then saved cards with the default first, then every
    /// bank channel. Nothing is selected.
    pub fn new(balance: Price, mut cards: Vec<SavedCard>) -> Self {
        cards.sort_by_key(|card| !card.is_default);

        let instruments = std::iter::once(PaymentInstrument::StoredBalance { balance })
            .chain(cards.into_iter().map(PaymentInstrument::Card))
            .chain(BankChannel::ALL.into_iter().map(PaymentInstrument::Bank))
            .collect();

        Self {
            instruments,
            selected: None,
        }
    }

    /// Instruments in display order.
    pub fn instruments(&self) -> &[PaymentInstrument] {
        &self.instruments
    }

    /// Live stored-value balance.
    pub fn balance(&self) -> Option<Price> {
        self.instruments.iter().find_map(|instrument| match instrument {
            PaymentInstrument::StoredBalance { balance } => Some(*balance),
            PaymentInstrument::Card(_) | PaymentInstrument::Bank(_) => None,
        })
    }

    /// The buyer's default card, if any.
    pub fn default_card(&self) -> Option<&SavedCard> {
        self.instruments.iter().find_map(|instrument| match instrument {
            PaymentInstrument::Card(card) if card.is_default => Some(card),
            _ => None,
        })
    }

    /// Select an instrument, replacing any previous selection.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::UnknownInstrument`] if it is not on offer.
    pub fn select(&mut self, id: InstrumentId) -> Result<(), PaymentError> {
        if !self.instruments.iter().any(|instrument| instrument.id() == id) {
            return Err(PaymentError::UnknownInstrument(id));
        }

        self.selected = Some(id);

        Ok(())
    }

    /// Preselect the default card when one exists. Returns whether it did.
    pub fn select_default_card(&mut self) -> bool {
        let Some(uuid) = self.default_card().map(|card| card.uuid) else {
            return false;
        };

        self.selected = Some(InstrumentId::Card(uuid));

        true
    }

    /// The selected instrument.
    pub fn selected(&self) -> Option<&PaymentInstrument> {
        let id = self.selected?;

        self.instruments
            .iter()
            .find(|instrument| instrument.id() == id)
    }

    /// Whether `instrument` can pay `total`.
    pub fn is_valid(instrument: &PaymentInstrument, total: Price) -> bool {
        instrument.is_valid(total)
    }
}
