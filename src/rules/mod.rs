//! Discount Rules
//!
//! The closed set of rule shapes the engine knows how to evaluate. Every rule is an
//! immutable value: evaluating it is a pure function of the basket, and its name is
//! derived from its configuration so differently configured rules never share one.

use thiserror::Error;

use crate::{
    basket::Basket,
    discounts::{DiscountCandidate, DiscountError},
    items::{BasketItem, match_key},
};

mod buy_one_get_one;
mod buy_x_get_y;
mod mix_and_match;
mod percent_off;

pub use buy_one_get_one::*;
pub use buy_x_get_y::*;
pub use mix_and_match::*;
pub use percent_off::*;

/// Rule configuration errors, raised before a rule is constructed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleConfigError {
    /// A field required by the rule type was not supplied.
    #[error("{field} is required")]
    Missing {
        /// Offending field
        field: &'static str,
    },

    /// A text field was empty or whitespace.
    #[error("{field} must not be blank")]
    Blank {
        /// Offending field
        field: &'static str,
    },

    /// A quantity or price was zero or negative.
    #[error("{field} must be positive")]
    NotPositive {
        /// Offending field
        field: &'static str,
    },

    /// A percentage was outside (0, 100].
    #[error("{field} must be greater than 0 and at most 100")]
    PercentOutOfRange {
        /// Offending field
        field: &'static str,
    },
}

impl RuleConfigError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field }
            | Self::Blank { field }
            | Self::NotPositive { field }
            | Self::PercentOutOfRange { field } => field,
        }
    }
}

/// A configured discount rule.
#[derive(Debug, Clone)]
pub enum Rule<'a> {
    /// Percentage off every item in a set of categories
    PercentOff(PercentOff),

    /// Every second unit free within a category
    BuyOneGetOne(BuyOneGetOne),

    /// Buy X, get Y free on the first item matching a keyword
    BuyXGetY(BuyXGetY),

    /// Fixed-price bundles across items matching a keyword set
    MixAndMatch(MixAndMatch<'a>),
}

impl<'a> Rule<'a> {
    /// Return the rule name, the key used for conflict resolution and dedup.
    pub fn name(&self) -> &str {
        match self {
            Rule::PercentOff(rule) => rule.name(),
            Rule::BuyOneGetOne(rule) => rule.name(),
            Rule::BuyXGetY(rule) => rule.name(),
            Rule::MixAndMatch(rule) => rule.name(),
        }
    }

    /// Return whether this rule's match criterion selects the given item.
    pub fn matches(&self, item: &BasketItem<'_>) -> bool {
        match self {
            Rule::PercentOff(rule) => rule.matches(item),
            Rule::BuyOneGetOne(rule) => rule.matches(item),
            Rule::BuyXGetY(rule) => rule.matches(item),
            Rule::MixAndMatch(rule) => rule.matches(item),
        }
    }

    /// Evaluate the rule against a basket.
    ///
    /// A rule with nothing to discount returns a zero-amount candidate.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] if price arithmetic overflows or currencies disagree.
    pub fn evaluate(&self, basket: &Basket<'a>) -> Result<DiscountCandidate<'a>, DiscountError> {
        match self {
            Rule::PercentOff(rule) => rule.evaluate(basket),
            Rule::BuyOneGetOne(rule) => rule.evaluate(basket),
            Rule::BuyXGetY(rule) => rule.evaluate(basket),
            Rule::MixAndMatch(rule) => rule.evaluate(basket),
        }
    }
}

impl From<PercentOff> for Rule<'_> {
    fn from(rule: PercentOff) -> Self {
        Rule::PercentOff(rule)
    }
}

impl From<BuyOneGetOne> for Rule<'_> {
    fn from(rule: BuyOneGetOne) -> Self {
        Rule::BuyOneGetOne(rule)
    }
}

impl From<BuyXGetY> for Rule<'_> {
    fn from(rule: BuyXGetY) -> Self {
        Rule::BuyXGetY(rule)
    }
}

impl<'a> From<MixAndMatch<'a>> for Rule<'a> {
    fn from(rule: MixAndMatch<'a>) -> Self {
        Rule::MixAndMatch(rule)
    }
}

/// Render a label as a rule name fragment: its match key with words joined by `_`.
///
/// A fragment never contains `__`, so fragments joined with `__` stay distinct.
pub(crate) fn name_fragment(label: &str) -> String {
    match_key(label).replace(' ', "_")
}

/// Join a set of match keys into one name fragment, sorted and deduplicated.
pub(crate) fn set_fragment<'k>(keys: impl IntoIterator<Item = &'k String>) -> String {
    let mut fragments: Vec<String> = keys.into_iter().map(|key| name_fragment(key)).collect();

    fragments.sort_unstable();
    fragments.dedup();

    fragments.join("__")
}

/// Normalise a list of categories or keywords to distinct, non-blank match keys,
/// keeping first-seen order.
pub(crate) fn match_keys<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut keys = Vec::new();

    for key in values.into_iter().map(|value| match_key(value.as_ref())) {
        if !key.is_empty() && !keys.contains(&key) {
            keys.push(key);
        }
    }

    keys
}

/// Reject empty or whitespace-only text, returning it trimmed.
pub(crate) fn require_text(value: &str, field: &'static str) -> Result<String, RuleConfigError> {
    let trimmed = value.trim();

    if trimmed.is_empty() {
        Err(RuleConfigError::Blank { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Multiply a unit price in minor units by a count.
pub(crate) fn times(unit_minor: i64, count: u64) -> Result<i64, DiscountError> {
    i64::try_from(count)
        .ok()
        .and_then(|count| unit_minor.checked_mul(count))
        .ok_or(DiscountError::Overflow)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use super::*;

    #[test]
    fn names_are_derived_from_configuration() -> TestResult {
        let rules: [Rule<'_>; 4] = [
            PercentOff::new(Decimal::from(10), ["FOOD"])?.into(),
            BuyOneGetOne::new("BEVERAGE")?.into(),
            BuyXGetY::new(2, 1, "Polar Pop")?.into(),
            MixAndMatch::energy_drinks(USD).into(),
        ];

        let names: Vec<&str> = rules.iter().map(Rule::name).collect();

        assert_eq!(
            names,
            [
                "PERCENT_OFF_10_FOOD",
                "BOGO_BEVERAGE",
                "BUY_2_GET_1_POLAR_POP",
                "MIX_MATCH_ENERGY_2FOR6.00__5_HR__BANG__CELSIUS__GHOST_ERGY__MONSTER__NOS__RED_BULL__REIGN__ROCKSTAR",
            ]
        );

        Ok(())
    }

    #[test]
    fn differently_configured_rules_have_distinct_names() -> TestResult {
        let a: Rule<'_> = BuyXGetY::new(2, 1, "POLAR POP")?.into();
        let b: Rule<'_> = BuyXGetY::new(2, 1, "SLURPEE")?.into();
        let c: Rule<'_> = PercentOff::new(Decimal::from(10), ["FOOD"])?.into();
        let d: Rule<'_> = PercentOff::new(Decimal::from(10), ["BEVERAGE"])?.into();

        assert_ne!(a.name(), b.name());
        assert_ne!(c.name(), d.name());

        Ok(())
    }

    #[test]
    fn matches_delegates_to_variant() -> TestResult {
        let coke = BasketItem::new("001", "Coke", Money::from_minor(200, USD), 1, "BEVERAGE");
        let monster = BasketItem::new(
            "002",
            "Monster Energy 16oz",
            Money::from_minor(329, USD),
            1,
            "BEVERAGE",
        );

        let bogo: Rule<'_> = BuyOneGetOne::new("BEVERAGE")?.into();
        let mix: Rule<'_> = MixAndMatch::energy_drinks(USD).into();

        assert!(bogo.matches(&coke));
        assert!(!mix.matches(&coke));
        assert!(mix.matches(&monster));

        Ok(())
    }

    #[test]
    fn config_error_names_field() {
        let err = RuleConfigError::NotPositive {
            field: "buy_quantity",
        };

        assert_eq!(err.field(), "buy_quantity");
        assert_eq!(err.to_string(), "buy_quantity must be positive");
    }

    #[test]
    fn name_fragment_joins_words() {
        assert_eq!(name_fragment(" polar  pop "), "POLAR_POP");
        assert_eq!(name_fragment("polar_pop"), "POLAR_POP");
    }

    #[test]
    fn set_fragment_is_order_independent() {
        let a = [String::from("FOOD"), String::from("SNACK")];
        let b = [String::from("SNACK"), String::from("FOOD"), String::from("FOOD")];

        assert_eq!(set_fragment(&a), "FOOD__SNACK");
        assert_eq!(set_fragment(&a), set_fragment(&b));
        assert_ne!(set_fragment(&[String::from("SNACK FOOD")]), set_fragment(&a));
    }

    #[test]
    fn times_overflow_errors() {
        assert!(matches!(times(i64::MAX, 2), Err(DiscountError::Overflow)));
        assert!(matches!(times(329, 3), Ok(987)));
    }
}
