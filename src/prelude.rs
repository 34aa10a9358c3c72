//! Harvest prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    bundles::{Bundle, BundleComponent, BundleError, BundlePricing, bundle_pricing},
    cart::{Cart, CartError, CartLineItem, SellerGroup},
    checkout::{
        AbortReason, AttemptError, CheckoutAttempt, CheckoutConfirmation, CheckoutState,
        ValidationError,
    },
    ids::{BuyerUuid, CardUuid, LedgerEntryUuid, OrderUuid, ProductUuid, SellerUuid, TypedUuid},
    orders::{
        DeliveryOption, OrderDraft, OrderError, OrderStatus, PaymentStatus, ProductSnapshot,
    },
    payments::{
        BankChannel, InstrumentId, PaymentError, PaymentInstrument, PaymentSelector, SavedCard,
    },
    prices::{Price, PriceError},
};
