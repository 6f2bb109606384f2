//! Discounts
//!
//! A [`DiscountCandidate`] is what a single rule proposes for a basket before
//! conflict resolution. It names the rule, carries the total amount and lists every
//! basket line the amount was computed from.

use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::SmallVec;
use thiserror::Error;

use crate::{items::ItemId, pricing::PricingError};

/// Errors raised while a rule evaluates a basket.
#[derive(Debug, Error)]
pub enum DiscountError {
    /// Quantity or price arithmetic overflowed.
    #[error("discount arithmetic overflowed")]
    Overflow,

    /// Wrapped pricing error.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped money arithmetic or currency mismatch error.
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// A basket line that contributed to a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct AffectedItem {
    /// Stable identifier of the line
    pub item_id: ItemId,

    /// Free-text description, for display only
    pub description: String,
}

/// A rule's proposed discount before conflict resolution.
#[derive(Debug, Clone)]
pub struct DiscountCandidate<'a> {
    rule_name: String,
    description: String,
    amount: Money<'a, Currency>,
    affected_items: SmallVec<[AffectedItem; 4]>,
}

impl<'a> DiscountCandidate<'a> {
    /// Create a new candidate.
    pub fn new(
        rule_name: impl Into<String>,
        description: impl Into<String>,
        amount: Money<'a, Currency>,
        affected_items: SmallVec<[AffectedItem; 4]>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            description: description.into(),
            amount,
            affected_items,
        }
    }

    /// A zero-amount candidate with no affected items.
    pub fn none(rule_name: impl Into<String>, currency: &'a Currency) -> Self {
        Self {
            rule_name: rule_name.into(),
            description: String::new(),
            amount: Money::from_minor(0, currency),
            affected_items: SmallVec::new(),
        }
    }

    /// Name of the rule that produced this candidate.
    pub fn rule_name(&self) -> &str {
        &self.rule_name
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Total amount discounted across all affected items.
    pub fn amount(&self) -> &Money<'a, Currency> {
        &self.amount
    }

    /// Lines this candidate's amount was computed from.
    pub fn affected_items(&self) -> &[AffectedItem] {
        &self.affected_items
    }

    /// True when the candidate takes part in conflict resolution.
    pub fn is_applicable(&self) -> bool {
        self.amount.to_minor_units() > 0 && !self.affected_items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use smallvec::smallvec;

    use super::*;

    fn affected(id: &str) -> AffectedItem {
        AffectedItem {
            item_id: ItemId::new(id),
            description: format!("item {id}"),
        }
    }

    #[test]
    fn none_is_not_applicable() {
        let candidate = DiscountCandidate::none("BOGO_BEVERAGE", USD);

        assert_eq!(candidate.amount().to_minor_units(), 0);
        assert!(candidate.affected_items().is_empty());
        assert!(!candidate.is_applicable());
    }

    #[test]
    fn positive_amount_with_items_is_applicable() {
        let candidate = DiscountCandidate::new(
            "BOGO_BEVERAGE",
            "Buy One Get One on BEVERAGE",
            Money::from_minor(200, USD),
            smallvec![affected("001")],
        );

        assert!(candidate.is_applicable());
        assert_eq!(candidate.rule_name(), "BOGO_BEVERAGE");
        assert_eq!(candidate.description(), "Buy One Get One on BEVERAGE");
    }

    #[test]
    fn zero_amount_with_items_is_not_applicable() {
        let candidate = DiscountCandidate::new(
            "PERCENT_OFF_10_ALL",
            "10% off everything",
            Money::from_minor(0, USD),
            smallvec![affected("001")],
        );

        assert!(!candidate.is_applicable());
    }

    #[test]
    fn amount_without_items_is_not_applicable() {
        let candidate =
            DiscountCandidate::new("X", "x", Money::from_minor(100, USD), SmallVec::new());

        assert!(!candidate.is_applicable());
    }
}
