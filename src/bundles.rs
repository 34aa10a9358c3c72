//! Bundles
//!
//! A bundle is a product offered at a flat price for a fixed set of
//! constituent products. Its discount is derived from the constituents'
//! current prices rather than stored.

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    ids::ProductUuid,
    prices::{self, Price, PriceError},
};

/// Errors specific to bundle pricing.
#[derive(Debug, Error, PartialEq)]
pub enum BundleError {
    /// Discount percentage could not be safely converted.
    #[error("discount percentage conversion overflowed")]
    PercentConversion,

    /// Wrapped price arithmetic error.
    #[error(transparent)]
    Price(#[from] PriceError),

    /// A constituent is priced in a different currency to the bundle.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// One constituent of a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundleComponent {
    /// Constituent product.
    pub product: ProductUuid,

    /// Units of the product included in the bundle.
    pub quantity: u32,
}

/// A bundled product offer.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    /// The bundle's own product id.
    pub product: ProductUuid,

    /// Flat bundle price.
    pub price: Price,

    /// Constituents.
    pub components: SmallVec<[BundleComponent; 4]>,
}

/// Derived pricing for a bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct BundlePricing {
    /// Σ constituent price × quantity, over constituents that resolved.
    pub original_total: Price,

    /// Whole-point discount relative to `original_total`.
    pub discount_percent: u32,

    /// Flat bundle price.
    pub bundle_price: Price,

    /// Constituents whose price could not be resolved and counted as zero.
    pub missing: SmallVec<[ProductUuid; 2]>,

    /// The part of `missing` whose lookup failed for a transient reason, such
    /// as a store outage, rather than because the product is gone. Resolving
    /// again later may price them.
    pub unavailable: SmallVec<[ProductUuid; 2]>,
}

impl BundlePricing {
    /// Whether every constituent contributed to the original total.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Amount saved against buying the constituents separately.
    pub fn savings(&self) -> Price {
        let minor = self
            .original_total
            .to_minor_units()
            .saturating_sub(self.bundle_price.to_minor_units())
            .max(0);

        Money::from_minor(minor, self.bundle_price.currency())
    }
}

/// Price a bundle from its constituents' unit prices.
///
/// `resolved` pairs each component with its current unit price, or `None` when
/// the product could not be found; such components contribute zero.
///
/// # Errors
///
/// Returns a [`BundleError`] if a constituent is priced in another currency or
/// the arithmetic overflows.
pub fn bundle_pricing(
    bundle_price: Price,
    resolved: &[(BundleComponent, Option<Price>)],
) -> Result<BundlePricing, BundleError> {
    let mut original_minor = 0_i64;
    let mut missing = SmallVec::new();

    for (component, price) in resolved {
        let Some(price) = price else {
            missing.push(component.product);
            continue;
        };

        prices::ensure_same_currency(&bundle_price, price)?;

        let line = prices::line_total(*price, component.quantity)?;

        original_minor = original_minor
            .checked_add(line.to_minor_units())
            .ok_or(PriceError::Overflow)?;
    }

    Ok(BundlePricing {
        original_total: Money::from_minor(original_minor, bundle_price.currency()),
        discount_percent: discount_percent(original_minor, bundle_price.to_minor_units())?,
        bundle_price,
        missing,
        unavailable: SmallVec::new(),
    })
}

/// `round((1 - bundle / original) × 100)`, zero when the original total is not
/// positive and clamped at zero when the bundle costs more than its parts.
fn discount_percent(original_minor: i64, bundle_minor: i64) -> Result<u32, BundleError> {
    if original_minor <= 0 {
        return Ok(0);
    }

    let ratio = Decimal::from(bundle_minor)
        .checked_div(Decimal::from(original_minor))
        .ok_or(BundleError::PercentConversion)?;

    let percent = (Decimal::ONE - ratio)
        .checked_mul(Decimal::ONE_HUNDRED)
        .ok_or(BundleError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

    if percent.is_sign_negative() {
        return Ok(0);
    }

    percent.to_u32().ok_or(BundleError::PercentConversion)
}
