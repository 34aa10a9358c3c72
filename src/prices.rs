//! Prices

use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

/// A money amount in one of the storefront's ISO currencies.
pub type Price = Money<'static, Currency>;

/// Errors that can occur during price arithmetic.
#[derive(Debug, Error, PartialEq)]
pub enum PriceError {
    /// A multiplication or sum left the range of minor units.
    #[error("price arithmetic overflowed")]
    Overflow,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was out of range")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Zero in the given currency.
pub fn zero(currency: &'static Currency) -> Price {
    Money::from_minor(0, currency)
}

/// Unit price multiplied by a quantity.
///
/// # Errors
///
/// Returns [`PriceError::Overflow`] when the product does not fit in minor units.
pub fn line_total(unit: Price, quantity: u32) -> Result<Price, PriceError> {
    unit.to_minor_units()
        .checked_mul(i64::from(quantity))
        .map(|minor| Money::from_minor(minor, unit.currency()))
        .ok_or(PriceError::Overflow)
}

/// Whole-point percentage of a price, rounded half away from zero.
///
/// # Errors
///
/// Returns [`PriceError::PercentConversion`] if the result cannot be represented
/// in minor units.
pub fn percent_of(price: Price, percent: u32) -> Result<Price, PriceError> {
    let minor = Decimal::from(price.to_minor_units());

    let applied = minor
        .checked_mul(Decimal::from(percent))
        .and_then(|value| value.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(PriceError::PercentConversion)?;

    let rounded = applied
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PriceError::PercentConversion)?;

    Ok(Money::from_minor(rounded, price.currency()))
}

/// Check that two prices share a currency.
///
/// # Errors
///
/// Returns [`MoneyError::CurrencyMismatch`] when they differ.
pub fn ensure_same_currency(expected: &Price, actual: &Price) -> Result<(), MoneyError> {
    if expected.currency() == actual.currency() {
        Ok(())
    } else {
        Err(MoneyError::CurrencyMismatch {
            expected: expected.currency().iso_alpha_code,
            actual: actual.currency().iso_alpha_code,
        })
    }
}
