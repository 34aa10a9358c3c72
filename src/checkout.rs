//! Checkout Attempts
//!
//! A single attempt moves `Draft → Validating → Committing → Committed`, or
//! ends in `Aborted`. Validation never touches the network: it runs against
//! the draft and the payment selector's live data. Once committing has begun
//! the attempt can no longer be cancelled.

use std::fmt;

use thiserror::Error;

use crate::{
    ids::OrderUuid,
    orders::OrderDraft,
    payments::{PaymentInstrument, PaymentSelector},
    prices::Price,
};

/// Problems the buyer can fix before anything is written.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    /// No payment instrument is selected.
    #[error("no payment method selected")]
    NoInstrumentSelected,

    /// The stored-value balance does not cover the total.
    #[error("insufficient balance")]
    InsufficientBalance {
        /// Total in minor units.
        required: i64,
        /// Balance in minor units.
        available: i64,
    },

    /// The quantity is below the seller's minimum order.
    #[error("minimum order is {minimum}, but {requested} were requested")]
    BelowMinimumOrder {
        /// Seller minimum.
        minimum: u32,
        /// Draft quantity.
        requested: u32,
    },

    /// The product does not have enough stock.
    #[error("only {available} in stock, but {requested} were requested")]
    InsufficientStock {
        /// Units in stock.
        available: u32,
        /// Draft quantity.
        requested: u32,
    },
}

/// Errors from driving an attempt through an illegal transition.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AttemptError {
    /// The attempt is not in a state that allows the operation.
    #[error("checkout attempt is {0}")]
    InvalidState(CheckoutState),

    /// Validation failed and the attempt was aborted.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Checkout attempt states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// Assembled, not yet validated.
    Draft,

    /// Passed validation, not yet submitted.
    Validating,

    /// Batch submitted; awaiting the store.
    Committing,

    /// The order exists.
    Committed,

    /// Ended without side effects.
    Aborted,
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Validating => "validating",
            Self::Committing => "committing",
            Self::Committed => "committed",
            Self::Aborted => "aborted",
        };

        f.write_str(label)
    }
}

/// Why an attempt was aborted.
#[derive(Debug, Clone, PartialEq)]
pub enum AbortReason {
    /// The buyer closed the confirmation sheet.
    Cancelled,

    /// Validation rejected the draft.
    Validation(ValidationError),

    /// The atomic commit failed or timed out.
    CommitFailed(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("checkout cancelled"),
            Self::Validation(error) => write!(f, "{error}"),
            Self::CommitFailed(_) => f.write_str("payment failed, retry"),
        }
    }
}

/// What the buyer sees after a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutConfirmation {
    /// Generated order id.
    pub order: OrderUuid,

    /// Display label of the instrument charged.
    pub payment_method: String,

    /// Amount charged.
    pub total: Price,
}

/// One checkout attempt for one order draft.
#[derive(Debug, Clone)]
pub struct CheckoutAttempt {
    draft: OrderDraft,
    state: CheckoutState,
    abort_reason: Option<AbortReason>,
    confirmation: Option<CheckoutConfirmation>,
}

impl CheckoutAttempt {
    /// Start an attempt in the draft state.
    pub fn new(draft: OrderDraft) -> Self {
        Self {
            draft,
            state: CheckoutState::Draft,
            abort_reason: None,
            confirmation: None,
        }
    }

    /// The order draft.
    pub fn draft(&self) -> &OrderDraft {
        &self.draft
    }

    /// Current state.
    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Why the attempt aborted, once it has.
    pub fn abort_reason(&self) -> Option<&AbortReason> {
        self.abort_reason.as_ref()
    }

    /// Confirmation, once committed.
    pub fn confirmation(&self) -> Option<&CheckoutConfirmation> {
        self.confirmation.as_ref()
    }

    /// Whether the attempt has reached `Committed` or `Aborted`.
    pub fn is_finished(&self) -> bool {
        matches!(self.state, CheckoutState::Committed | CheckoutState::Aborted)
    }

    /// Validate the draft against the selected instrument.
    ///
    /// On success the attempt is `Validating` and the chosen instrument is
    /// returned; on failure it is `Aborted`.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::InvalidState`] unless the attempt is a draft, or
    /// [`AttemptError::Validation`] when the draft cannot be paid for.
    pub fn validate(
        &mut self,
        payment: &PaymentSelector,
    ) -> Result<PaymentInstrument, AttemptError> {
        self.require(CheckoutState::Draft)?;
        self.state = CheckoutState::Validating;

        match check(&self.draft, payment) {
            Ok(instrument) => Ok(instrument),
            Err(error) => {
                self.abort(AbortReason::Validation(error.clone()));
                Err(AttemptError::Validation(error))
            }
        }
    }

    /// Move from `Validating` to `Committing`. After this the attempt cannot be
    /// cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::InvalidState`] unless validation has passed.
    pub fn begin_commit(&mut self) -> Result<(), AttemptError> {
        self.require(CheckoutState::Validating)?;
        self.state = CheckoutState::Committing;

        Ok(())
    }

    /// Record a successful commit.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::InvalidState`] unless the attempt is committing.
    pub fn commit_succeeded(
        &mut self,
        confirmation: CheckoutConfirmation,
    ) -> Result<(), AttemptError> {
        self.require(CheckoutState::Committing)?;
        self.state = CheckoutState::Committed;
        self.confirmation = Some(confirmation);

        Ok(())
    }

    /// Record a failed commit. No side effects are assumed to have happened.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::InvalidState`] unless the attempt is committing.
    pub fn commit_failed(&mut self, cause: impl Into<String>) -> Result<(), AttemptError> {
        self.require(CheckoutState::Committing)?;
        self.abort(AbortReason::CommitFailed(cause.into()));

        Ok(())
    }

    /// Cancel before committing begins. Cancelling an aborted attempt is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::InvalidState`] once the attempt is committing or
    /// committed.
    pub fn cancel(&mut self) -> Result<(), AttemptError> {
        match self.state {
            CheckoutState::Draft | CheckoutState::Validating => {
                self.abort(AbortReason::Cancelled);
                Ok(())
            }
            CheckoutState::Aborted => Ok(()),
            CheckoutState::Committing | CheckoutState::Committed => {
                Err(AttemptError::InvalidState(self.state))
            }
        }
    }

    /// Start a fresh attempt after an abort, optionally with a refreshed draft.
    ///
    /// # Errors
    ///
    /// Returns [`AttemptError::InvalidState`] unless this attempt was aborted.
    pub fn retry(&self, draft: Option<OrderDraft>) -> Result<Self, AttemptError> {
        self.require(CheckoutState::Aborted)?;

        Ok(Self::new(draft.unwrap_or_else(|| self.draft.clone())))
    }

    fn require(&self, state: CheckoutState) -> Result<(), AttemptError> {
        if self.state == state {
            Ok(())
        } else {
            Err(AttemptError::InvalidState(self.state))
        }
    }

    fn abort(&mut self, reason: AbortReason) {
        self.state = CheckoutState::Aborted;
        self.abort_reason = Some(reason);
    }
}

fn check(
    draft: &OrderDraft,
    payment: &PaymentSelector,
) -> Result<PaymentInstrument, ValidationError> {
    let product = draft.product();

    if draft.quantity() < product.min_order {
        return Err(ValidationError::BelowMinimumOrder {
            minimum: product.min_order,
            requested: draft.quantity(),
        });
    }

    if let Some(available) = product.stock
        && draft.quantity() > available
    {
        return Err(ValidationError::InsufficientStock {
            available,
            requested: draft.quantity(),
        });
    }

    let instrument = payment
        .selected()
        .ok_or(ValidationError::NoInstrumentSelected)?;

    if !PaymentSelector::is_valid(instrument, draft.total()) {
        let available = payment
            .balance()
            .map_or(0, |balance| balance.to_minor_units());

        return Err(ValidationError::InsufficientBalance {
            required: draft.total().to_minor_units(),
            available,
        });
    }

    Ok(instrument.clone())
}
