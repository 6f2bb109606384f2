//! Buy One Get One

use rusty_money::Money;
use smallvec::SmallVec;

use crate::{
    basket::Basket,
    discounts::{AffectedItem, DiscountCandidate, DiscountError},
    items::{BasketItem, match_key},
    rules::{RuleConfigError, name_fragment, require_text, times},
};

/// Every second unit of a line in the category is free.
#[derive(Debug, Clone)]
pub struct BuyOneGetOne {
    name: String,
    category: String,
}

impl BuyOneGetOne {
    /// Create a BOGO rule for a category. Categories are compared by [`match_key`],
    /// so `Beverage` and `BEVERAGE` name the same category.
    ///
    /// # Errors
    ///
    /// Returns [`RuleConfigError::Blank`] if the category is blank.
    pub fn new(category: impl AsRef<str>) -> Result<Self, RuleConfigError> {
        let category = match_key(&require_text(category.as_ref(), "category")?);

        Ok(Self {
            name: format!("BOGO_{}", name_fragment(&category)),
            category,
        })
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Match key of the category the rule applies to
    pub fn category(&self) -> &str {
        &self.category
    }

    /// True if the item is in the rule's category.
    pub fn matches(&self, item: &BasketItem<'_>) -> bool {
        item.in_category(&self.category)
    }

    /// Evaluate against a basket.
    ///
    /// Matched lines are visited cheapest first; each contributes
    /// `floor(quantity / 2)` free units at its own price.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] on overflow.
    pub fn evaluate<'a>(
        &self,
        basket: &Basket<'a>,
    ) -> Result<DiscountCandidate<'a>, DiscountError> {
        let mut eligible: SmallVec<[&BasketItem<'a>; 8]> =
            basket.iter().filter(|item| self.matches(item)).collect();

        if eligible.is_empty() {
            return Ok(DiscountCandidate::none(&self.name, basket.currency()));
        }

        eligible.sort_by_key(|item| item.unit_minor());

        let mut amount_minor = 0i64;
        let mut affected = SmallVec::new();

        for item in eligible {
            let pairs = u64::from(item.quantity() / 2);

            if pairs == 0 {
                continue;
            }

            amount_minor = amount_minor
                .checked_add(times(item.unit_minor(), pairs)?)
                .ok_or(DiscountError::Overflow)?;

            affected.push(AffectedItem {
                item_id: item.id().clone(),
                description: item.description().to_string(),
            });
        }

        Ok(DiscountCandidate::new(
            &self.name,
            format!("Buy One Get One on {}", self.category),
            Money::from_minor(amount_minor, basket.currency()),
            affected,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn pair_of_drinks_gets_one_free() -> TestResult {
        let basket = Basket::with_items(
            [BasketItem::new("001", "Coke", Money::from_minor(200, USD), 2, "BEVERAGE")],
            USD,
        )?;

        let candidate = BuyOneGetOne::new("BEVERAGE")?.evaluate(&basket)?;

        assert_eq!(candidate.amount(), &Money::from_minor(200, USD));
        assert_eq!(candidate.description(), "Buy One Get One on BEVERAGE");
        assert_eq!(candidate.affected_items().len(), 1);

        Ok(())
    }

    #[test]
    fn odd_quantity_forms_floor_pairs() -> TestResult {
        let basket = Basket::with_items(
            [BasketItem::new(
                "001",
                "Monster",
                Money::from_minor(329, USD),
                3,
                "BEVERAGE",
            )],
            USD,
        )?;

        let candidate = BuyOneGetOne::new("BEVERAGE")?.evaluate(&basket)?;

        assert_eq!(candidate.amount(), &Money::from_minor(329, USD));

        Ok(())
    }

    #[test]
    fn single_units_are_not_affected() -> TestResult {
        let basket = Basket::with_items(
            [
                BasketItem::new("001", "Coke", Money::from_minor(200, USD), 1, "BEVERAGE"),
                BasketItem::new("002", "Water", Money::from_minor(100, USD), 4, "BEVERAGE"),
            ],
            USD,
        )?;

        let candidate = BuyOneGetOne::new("BEVERAGE")?.evaluate(&basket)?;

        assert_eq!(candidate.amount(), &Money::from_minor(200, USD));
        assert_eq!(
            candidate.affected_items().first().map(|a| a.item_id.as_str()),
            Some("002")
        );
        assert_eq!(candidate.affected_items().len(), 1);

        Ok(())
    }

    #[test]
    fn affected_items_are_cheapest_first() -> TestResult {
        let basket = Basket::with_items(
            [
                BasketItem::new("001", "Red Bull", Money::from_minor(399, USD), 2, "BEVERAGE"),
                BasketItem::new("002", "Water", Money::from_minor(100, USD), 2, "BEVERAGE"),
            ],
            USD,
        )?;

        let candidate = BuyOneGetOne::new("BEVERAGE")?.evaluate(&basket)?;

        let ids: Vec<&str> = candidate
            .affected_items()
            .iter()
            .map(|a| a.item_id.as_str())
            .collect();

        assert_eq!(ids, ["002", "001"]);
        assert_eq!(candidate.amount(), &Money::from_minor(499, USD));

        Ok(())
    }

    #[test]
    fn other_categories_are_ignored() -> TestResult {
        let basket = Basket::with_items(
            [BasketItem::new("003", "Pizza", Money::from_minor(1000, USD), 2, "FOOD")],
            USD,
        )?;

        let candidate = BuyOneGetOne::new("BEVERAGE")?.evaluate(&basket)?;

        assert!(!candidate.is_applicable());

        Ok(())
    }

    #[test]
    fn category_case_does_not_split_rules() -> TestResult {
        let basket = Basket::with_items(
            [
                BasketItem::new("001", "Coke", Money::from_minor(200, USD), 2, "BEVERAGE"),
                BasketItem::new("002", "Lemonade", Money::from_minor(150, USD), 2, "Beverage"),
            ],
            USD,
        )?;

        let lower = BuyOneGetOne::new("Beverage")?;
        let upper = BuyOneGetOne::new("BEVERAGE")?;

        assert_eq!(lower.name(), upper.name());
        assert_eq!(lower.category(), "BEVERAGE");

        // Both lines are in the same category, so one rule covers both.
        let candidate = lower.evaluate(&basket)?;

        assert_eq!(candidate.amount(), &Money::from_minor(350, USD));
        assert_eq!(candidate.affected_items().len(), 2);

        Ok(())
    }

    #[test]
    fn multi_word_categories_are_named_by_words() -> TestResult {
        assert_eq!(BuyOneGetOne::new("hot  food")?.name(), "BOGO_HOT_FOOD");
        assert_eq!(BuyOneGetOne::new("HOT_FOOD")?.name(), "BOGO_HOT_FOOD");

        Ok(())
    }

    #[test]
    fn blank_category_is_rejected() {
        assert_eq!(
            BuyOneGetOne::new(" ").err(),
            Some(RuleConfigError::Blank { field: "category" })
        );
    }
}
