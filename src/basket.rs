//! Basket

use rustc_hash::FxHashMap;
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    items::{BasketItem, ItemId},
    pricing::{PricingError, total_price},
};

/// Errors related to basket construction or totals.
#[derive(Debug, Error, PartialEq)]
pub enum BasketError {
    /// An item's currency differs from the basket currency (index, item currency, basket currency).
    #[error("Item {0} has currency {1}, but basket has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// Two lines share the same identifier (index of the second line, identifier).
    #[error("Item {0} reuses identifier {1}")]
    DuplicateItemId(usize, ItemId),

    /// A line was given a quantity of zero.
    #[error("Item {0} has a quantity of zero")]
    ZeroQuantity(usize),

    /// A line was given a negative unit price.
    #[error("Item {0} has a negative price")]
    NegativePrice(usize),
}

/// Basket
#[derive(Debug)]
pub struct Basket<'a> {
    items: Vec<BasketItem<'a>>,
    index: FxHashMap<ItemId, usize>,
    currency: &'static Currency,
}

impl<'a> Basket<'a> {
    /// Create a new, empty basket.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Basket {
            items: Vec::new(),
            index: FxHashMap::default(),
            currency,
        }
    }

    /// Create a new basket with the given items.
    ///
    /// # Errors
    ///
    /// Returns a `BasketError` if an item is priced in another currency, reuses an
    /// identifier, has a zero quantity or a negative price.
    pub fn with_items(
        items: impl Into<Vec<BasketItem<'a>>>,
        currency: &'static Currency,
    ) -> Result<Self, BasketError> {
        let items = items.into();
        let mut index = FxHashMap::default();

        for (i, item) in items.iter().enumerate() {
            let item_currency = item.price().currency();

            if item_currency != currency {
                return Err(BasketError::CurrencyMismatch(
                    i,
                    item_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            if item.quantity() == 0 {
                return Err(BasketError::ZeroQuantity(i));
            }

            if item.unit_minor() < 0 {
                return Err(BasketError::NegativePrice(i));
            }

            if index.insert(item.id().clone(), i).is_some() {
                return Err(BasketError::DuplicateItemId(i, item.id().clone()));
            }
        }

        Ok(Basket {
            items,
            index,
            currency,
        })
    }

    /// Calculate the subtotal (Σ price × quantity) of the basket.
    ///
    /// # Errors
    ///
    /// Returns a `PricingError` if there was a money arithmetic or overflow error.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PricingError> {
        if self.is_empty() {
            return Ok(Money::from_minor(0, self.currency));
        }

        total_price(&self.items)
    }

    /// Look up a line by its identifier.
    pub fn get(&self, id: &ItemId) -> Option<&BasketItem<'a>> {
        self.index.get(id).and_then(|&idx| self.items.get(idx))
    }

    /// Iterate over the items in the basket.
    pub fn iter(&self) -> impl Iterator<Item = &BasketItem<'a>> {
        self.items.iter()
    }

    /// The items as a slice.
    pub fn items(&self) -> &[BasketItem<'a>] {
        &self.items
    }

    /// Get the number of lines in the basket.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the basket is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the basket.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }
}
