//! Percent Off
//!
//! A percentage off the line total of every item in a set of categories.

use decimal_percentage::Percentage;
use rust_decimal::Decimal;
use rusty_money::Money;
use smallvec::SmallVec;

use crate::{
    basket::Basket,
    discounts::{AffectedItem, DiscountCandidate, DiscountError},
    items::BasketItem,
    pricing::percent_of_minor,
    rules::{RuleConfigError, match_keys, set_fragment},
};

/// Category key that stands for every item.
pub const ALL_CATEGORIES: &str = "ALL";

/// Percentage discount on matching categories. An empty category set, or one that
/// names [`ALL_CATEGORIES`], matches all items.
#[derive(Debug, Clone)]
pub struct PercentOff {
    name: String,
    points: Decimal,
    percentage: Percentage,
    categories: SmallVec<[String; 2]>,
}

impl PercentOff {
    /// Create a percent-off rule for the given categories.
    ///
    /// `points` is in percent points, so `10` means 10% off. Categories are
    /// compared by match key. Blank and repeated categories are ignored; if none
    /// remain, or one of them is [`ALL_CATEGORIES`], the rule applies to every item.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::PercentOutOfRange`] unless `0 < points <= 100`.
    pub fn new<I, S>(points: Decimal, categories: I) -> Result<Self, RuleConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if points <= Decimal::ZERO || points > Decimal::ONE_HUNDRED {
            return Err(RuleConfigError::PercentOutOfRange {
                field: "percent_off",
            });
        }

        let mut categories: SmallVec<[String; 2]> = match_keys(categories).into_iter().collect();

        if categories.iter().any(|category| category == ALL_CATEGORIES) {
            categories.clear();
        }

        let points = points.normalize();

        let scope = if categories.is_empty() {
            ALL_CATEGORIES.to_string()
        } else {
            set_fragment(&categories)
        };

        Ok(Self {
            name: format!("PERCENT_OFF_{points}_{scope}"),
            points,
            percentage: Percentage::from(points / Decimal::ONE_HUNDRED),
            categories,
        })
    }

    /// Create a percent-off rule that applies to every item.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::PercentOutOfRange`] unless `0 < points <= 100`.
    pub fn all_items(points: Decimal) -> Result<Self, RuleConfigError> {
        Self::new(points, std::iter::empty::<&str>())
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Percent points off
    pub fn points(&self) -> Decimal {
        self.points
    }

    /// Match keys of the categories this rule is limited to
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    /// True if the item's category is in the configured set (or the set is empty).
    pub fn matches(&self, item: &BasketItem<'_>) -> bool {
        self.categories.is_empty()
            || self
                .categories
                .iter()
                .any(|category| item.in_category(category))
    }

    fn description(&self) -> String {
        if self.categories.is_empty() {
            format!("{}% off everything", self.points)
        } else {
            format!("{}% off {}", self.points, self.categories.join(", "))
        }
    }

    /// Evaluate against a basket; each line is rounded to minor units before summing.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] on overflow.
    pub fn evaluate<'a>(
        &self,
        basket: &Basket<'a>,
    ) -> Result<DiscountCandidate<'a>, DiscountError> {
        let mut amount_minor = 0i64;
        let mut affected = SmallVec::new();

        for item in basket.iter().filter(|item| self.matches(item)) {
            let line_minor = item.line_total_minor().ok_or(DiscountError::Overflow)?;

            amount_minor = amount_minor
                .checked_add(percent_of_minor(&self.percentage, line_minor)?)
                .ok_or(DiscountError::Overflow)?;

            affected.push(AffectedItem {
                item_id: item.id().clone(),
                description: item.description().to_string(),
            });
        }

        if affected.is_empty() {
            return Ok(DiscountCandidate::none(&self.name, basket.currency()));
        }

        Ok(DiscountCandidate::new(
            &self.name,
            self.description(),
            Money::from_minor(amount_minor, basket.currency()),
            affected,
        ))
    }
}
