//! Pricing

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use rusty_money::{Money, MoneyError, iso::Currency};
use thiserror::Error;

use crate::items::BasketItem;

/// Errors that can occur while calculating prices.
#[derive(Debug, Error, PartialEq)]
pub enum PricingError {
    /// No items were provided, so currency could not be determined.
    #[error("no items provided; cannot determine currency")]
    NoItems,

    /// Line or running total does not fit in minor units.
    #[error("price arithmetic overflowed")]
    Overflow,

    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Sales tax rate applied to the discounted subtotal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TaxRate(Percentage);

impl TaxRate {
    /// Create a tax rate from a fraction (e.g. `0.07` for 7%).
    pub fn from_fraction(fraction: Decimal) -> Self {
        Self(Percentage::from(fraction))
    }

    /// The rate as a percentage.
    pub fn percentage(&self) -> &Percentage {
        &self.0
    }

    /// Tax owed on an amount, rounded to whole minor units.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::PercentConversion`] if the result cannot be represented.
    pub fn tax_on<'a>(
        &self,
        amount: &Money<'a, Currency>,
    ) -> Result<Money<'a, Currency>, PricingError> {
        let minor = percent_of_minor(&self.0, amount.to_minor_units())?;

        Ok(Money::from_minor(minor, amount.currency()))
    }
}

impl Default for TaxRate {
    /// The flat 7% rate.
    fn default() -> Self {
        Self::from_fraction(Decimal::new(7, 2))
    }
}

/// Calculates the total price (unit price × quantity) of a list of basket items
///
/// # Errors
///
/// - [`PricingError::NoItems`]: No items were provided, so currency could not be determined.
/// - [`PricingError::Overflow`]: A line total does not fit in minor units.
/// - [`PricingError::Money`]: Wrapped money arithmetic or currency mismatch error.
pub fn total_price<'a>(items: &[BasketItem<'a>]) -> Result<Money<'a, Currency>, PricingError> {
    let first = items.first().ok_or(PricingError::NoItems)?;

    let total = items.iter().try_fold(
        Money::from_minor(0, first.price().currency()),
        |acc, item| -> Result<_, PricingError> {
            let line = item.line_total_minor().ok_or(PricingError::Overflow)?;

            Ok(acc.add(Money::from_minor(line, item.price().currency()))?)
        },
    )?;

    Ok(total)
}

/// Calculate a percentage of a minor unit amount, rounded midpoint-away-from-zero.
///
/// # Errors
///
/// Returns [`PricingError::PercentConversion`] if the multiplication overflows or the
/// result does not fit in an `i64`.
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, PricingError> {
    let minor = Decimal::from_i64(minor).ok_or(PricingError::PercentConversion)?;

    ((*percent) * Decimal::ONE) // decimal_percentage doesn't expose the underlying Decimal
        .checked_mul(minor)
        .ok_or(PricingError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::PercentConversion)
}

/// Convert a major-unit decimal amount (e.g. `3.29`) to minor units of a currency,
/// rounded midpoint-away-from-zero to the currency's exponent.
///
/// # Errors
///
/// Returns [`PricingError::Overflow`] if the amount does not fit in an `i64`.
pub fn minor_units_from_decimal(amount: Decimal, currency: &Currency) -> Result<i64, PricingError> {
    let scale = 10i64
        .checked_pow(currency.exponent)
        .ok_or(PricingError::Overflow)?;

    amount
        .checked_mul(Decimal::from(scale))
        .ok_or(PricingError::Overflow)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(PricingError::Overflow)
}
