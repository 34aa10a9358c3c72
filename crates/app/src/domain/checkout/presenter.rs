//! Confirmation Presenter

use harvest::{
    checkout::{AbortReason, CheckoutAttempt, CheckoutConfirmation, CheckoutState},
    ids::BuyerUuid,
    payments::PaymentSelector,
};
use mockall::automock;
use tracing::info;

use crate::domain::checkout::{CheckoutError, CheckoutService};

/// Renders the outcome of a finished checkout attempt.
#[automock]
pub trait ConfirmationPresenter: Send + Sync {
    /// The order was placed.
    fn committed(&self, confirmation: &CheckoutConfirmation);

    /// The attempt ended without side effects.
    fn aborted(&self, reason: &AbortReason);
}

/// Presents outcomes as log events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPresenter;

impl ConfirmationPresenter for LogPresenter {
    fn committed(&self, confirmation: &CheckoutConfirmation) {
        info!(
            order_uuid = %confirmation.order,
            payment_method = %confirmation.payment_method,
            total = %confirmation.total,
            "order placed"
        );
    }

    fn aborted(&self, reason: &AbortReason) {
        info!(%reason, "checkout aborted");
    }
}

/// Commit the attempt and hand its outcome to the presenter.
///
/// The presenter is only told about attempts this call finished; an attempt
/// driven from the wrong state is reported to the caller alone.
///
/// # Errors
///
/// Returns the [`CheckoutError`] from [`CheckoutService::commit`].
pub async fn checkout_and_present(
    checkout: &dyn CheckoutService,
    presenter: &dyn ConfirmationPresenter,
    buyer: BuyerUuid,
    attempt: &mut CheckoutAttempt,
    payment: &PaymentSelector,
) -> Result<CheckoutConfirmation, CheckoutError> {
    if attempt.is_finished() {
        return checkout.commit(buyer, attempt, payment).await;
    }

    let result = checkout.commit(buyer, attempt, payment).await;

    match (attempt.state(), attempt.confirmation(), attempt.abort_reason()) {
        (CheckoutState::Committed, Some(confirmation), _) => presenter.committed(confirmation),
        (CheckoutState::Aborted, _, Some(reason)) => presenter.aborted(reason),
        _ => {}
    }

    result
}
