//! Basket Fixtures

use rusty_money::{
    Money,
    iso::{Currency, EUR, GBP, USD},
};
use serde::Deserialize;

use crate::{
    basket::Basket,
    fixtures::{FixtureError, rules::parse_amount},
    items::BasketItem,
    pricing::minor_units_from_decimal,
};

/// Basket from YAML
#[derive(Debug, Deserialize)]
pub struct BasketFixture {
    /// ISO currency code for every price in the basket
    pub currency: String,

    /// Basket lines
    #[serde(default)]
    pub items: Vec<ItemFixture>,
}

/// Basket line from YAML
#[derive(Debug, Deserialize)]
pub struct ItemFixture {
    /// Line identifier (quote numeric ids)
    pub id: String,

    /// Item description
    pub description: String,

    /// Unit price string (e.g. "3.29")
    pub price: String,

    /// Units bought
    pub quantity: u32,

    /// Category label
    pub category: String,
}

impl BasketFixture {
    /// Build a validated basket.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown currency, a malformed price, or a basket that
    /// fails validation.
    pub fn try_into_basket(self) -> Result<Basket<'static>, FixtureError> {
        let currency = parse_currency(&self.currency)?;

        let items = self
            .items
            .into_iter()
            .map(|item| {
                let price = parse_price(&item.price, currency)?;

                Ok(BasketItem::new(
                    item.id,
                    item.description,
                    price,
                    item.quantity,
                    item.category,
                ))
            })
            .collect::<Result<Vec<_>, FixtureError>>()?;

        Ok(Basket::with_items(items, currency)?)
    }
}

/// Parse an ISO currency code.
///
/// # Errors
///
/// Returns [`FixtureError::UnknownCurrency`] for anything other than GBP, USD or EUR.
pub fn parse_currency(code: &str) -> Result<&'static Currency, FixtureError> {
    match code.trim() {
        "GBP" => Ok(GBP),
        "USD" => Ok(USD),
        "EUR" => Ok(EUR),
        other => Err(FixtureError::UnknownCurrency(other.to_string())),
    }
}

/// Parse a price string such as `"3.29"` into money of the given currency.
///
/// # Errors
///
/// Returns an error if the string is not a decimal amount.
pub fn parse_price(
    s: &str,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, FixtureError> {
    let amount = parse_amount(s)?;
    let minor_units = minor_units_from_decimal(amount, currency)?;

    Ok(Money::from_minor(minor_units, currency))
}
