//! Items

use std::fmt;

use rusty_money::{Money, iso::Currency};

/// Stable identifier of one physical basket line (e.g. a UPC).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(String);

impl ItemId {
    /// Create a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// A line in the basket: a unit price, a quantity and the labels rules match on.
#[derive(Clone, Debug, PartialEq)]
pub struct BasketItem<'a> {
    id: ItemId,
    description: String,
    price: Money<'a, Currency>,
    quantity: u32,
    category: String,
}

impl<'a> BasketItem<'a> {
    /// Creates a new basket line.
    pub fn new(
        id: impl Into<ItemId>,
        description: impl Into<String>,
        price: Money<'a, Currency>,
        quantity: u32,
        category: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            price,
            quantity,
            category: category.into(),
        }
    }

    /// Returns the stable identifier of the line
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Returns the free-text description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the unit price
    pub fn price(&self) -> &Money<'a, Currency> {
        &self.price
    }

    /// Returns the quantity purchased
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the category label
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Unit price in minor units.
    pub fn unit_minor(&self) -> i64 {
        self.price.to_minor_units()
    }

    /// Price × quantity in minor units, or `None` on overflow.
    pub fn line_total_minor(&self) -> Option<i64> {
        self.unit_minor().checked_mul(i64::from(self.quantity))
    }

    /// Substring match on the description, compared as [`match_key`]s.
    ///
    /// `keyword` is expected to be a match key already.
    pub fn description_contains(&self, keyword: &str) -> bool {
        match_key(&self.description).contains(keyword)
    }

    /// True if the category has the given match key.
    pub fn in_category(&self, category: &str) -> bool {
        match_key(&self.category) == category
    }
}

/// Canonical form used for category and keyword matching: upper-cased words
/// separated by one space, with `_` read as a space.
pub fn match_key(value: &str) -> String {
    value
        .split(|c: char| c.is_whitespace() || c == '_')
        .filter(|word| !word.is_empty())
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
