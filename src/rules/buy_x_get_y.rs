//! Buy X Get Y
//!
//! Buy `x` units of an item, get `y` more free. Applies to the first basket line
//! whose description contains the keyword.

use rusty_money::Money;
use smallvec::smallvec;

use crate::{
    basket::Basket,
    discounts::{AffectedItem, DiscountCandidate, DiscountError},
    items::{BasketItem, match_key},
    rules::{RuleConfigError, name_fragment, require_text, times},
};

/// Buy-X-get-Y-free on a keyword-matched item.
#[derive(Debug, Clone)]
pub struct BuyXGetY {
    name: String,
    buy_quantity: u32,
    free_quantity: u32,
    keyword: String,
}

impl BuyXGetY {
    /// Create a new rule. The keyword is compared by [`match_key`], so case and
    /// spacing do not matter.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleConfigError`] if either quantity is zero or the keyword is blank.
    pub fn new(
        buy_quantity: u32,
        free_quantity: u32,
        keyword: impl AsRef<str>,
    ) -> Result<Self, RuleConfigError> {
        if buy_quantity == 0 {
            return Err(RuleConfigError::NotPositive {
                field: "buy_quantity",
            });
        }

        if free_quantity == 0 {
            return Err(RuleConfigError::NotPositive {
                field: "free_quantity",
            });
        }

        let keyword = match_key(&require_text(keyword.as_ref(), "item_keyword")?);

        Ok(Self {
            name: format!(
                "BUY_{buy_quantity}_GET_{free_quantity}_{}",
                name_fragment(&keyword)
            ),
            buy_quantity,
            free_quantity,
            keyword,
        })
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Units that must be bought
    pub fn buy_quantity(&self) -> u32 {
        self.buy_quantity
    }

    /// Units given free per set
    pub fn free_quantity(&self) -> u32 {
        self.free_quantity
    }

    /// Keyword match key
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// True if the item's description contains the keyword.
    pub fn matches(&self, item: &BasketItem<'_>) -> bool {
        item.description_contains(&self.keyword)
    }

    /// Evaluate against a basket.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] on overflow.
    pub fn evaluate<'a>(
        &self,
        basket: &Basket<'a>,
    ) -> Result<DiscountCandidate<'a>, DiscountError> {
        let none = || DiscountCandidate::none(&self.name, basket.currency());

        let Some(target) = basket.iter().find(|item| self.matches(item)) else {
            return Ok(none());
        };

        if target.quantity() < self.buy_quantity {
            return Ok(none());
        }

        let set_size = u64::from(self.buy_quantity) + u64::from(self.free_quantity);
        let sets = u64::from(target.quantity()) / set_size;

        if sets == 0 {
            return Ok(none());
        }

        let free_units = sets
            .checked_mul(u64::from(self.free_quantity))
            .ok_or(DiscountError::Overflow)?;

        Ok(DiscountCandidate::new(
            &self.name,
            format!(
                "Buy {} Get {} Free on {}",
                self.buy_quantity, self.free_quantity, self.keyword
            ),
            Money::from_minor(times(target.unit_minor(), free_units)?, basket.currency()),
            smallvec![AffectedItem {
                item_id: target.id().clone(),
                description: target.description().to_string(),
            }],
        ))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn polar_pop<'a>(quantity: u32) -> BasketItem<'a> {
        BasketItem::new(
            "0491",
            "Polar Pop 32oz",
            Money::from_minor(99, USD),
            quantity,
            "BEVERAGE",
        )
    }

    #[test]
    fn three_units_earn_one_free() -> TestResult {
        let basket = Basket::with_items([polar_pop(3)], USD)?;

        let candidate = BuyXGetY::new(2, 1, "POLAR POP")?.evaluate(&basket)?;

        assert_eq!(candidate.amount(), &Money::from_minor(99, USD));
        assert_eq!(candidate.description(), "Buy 2 Get 1 Free on POLAR POP");

        Ok(())
    }

    #[test]
    fn incomplete_set_is_zero() -> TestResult {
        let basket = Basket::with_items([polar_pop(2)], USD)?;

        let candidate = BuyXGetY::new(2, 1, "POLAR POP")?.evaluate(&basket)?;

        assert_eq!(candidate.amount().to_minor_units(), 0);
        assert!(!candidate.is_applicable());

        Ok(())
    }

    #[test]
    fn below_buy_quantity_is_zero() -> TestResult {
        let basket = Basket::with_items([polar_pop(1)], USD)?;

        let candidate = BuyXGetY::new(2, 1, "POLAR POP")?.evaluate(&basket)?;

        assert!(!candidate.is_applicable());

        Ok(())
    }

    #[test]
    fn multiple_sets_multiply_free_units() -> TestResult {
        let basket = Basket::with_items([polar_pop(7)], USD)?;

        // floor(7 / 3) = 2 sets, 2 free units
        let candidate = BuyXGetY::new(2, 1, "polar pop")?.evaluate(&basket)?;

        assert_eq!(candidate.amount(), &Money::from_minor(198, USD));

        Ok(())
    }

    #[test]
    fn only_first_matching_line_is_used() -> TestResult {
        let basket = Basket::with_items(
            [
                BasketItem::new("0491", "Polar Pop 32oz", Money::from_minor(99, USD), 1, "BEVERAGE"),
                BasketItem::new("0492", "Polar Pop 44oz", Money::from_minor(129, USD), 6, "BEVERAGE"),
            ],
            USD,
        )?;

        let candidate = BuyXGetY::new(2, 1, "POLAR POP")?.evaluate(&basket)?;

        assert!(!candidate.is_applicable());

        Ok(())
    }

    #[test]
    fn invalid_configuration_names_field() {
        assert_eq!(
            BuyXGetY::new(0, 1, "POLAR POP").err().map(|e| e.field()),
            Some("buy_quantity")
        );
        assert_eq!(
            BuyXGetY::new(2, 0, "POLAR POP").err().map(|e| e.field()),
            Some("free_quantity")
        );
        assert_eq!(
            BuyXGetY::new(2, 1, "").err().map(|e| e.field()),
            Some("item_keyword")
        );
    }

    #[test]
    fn keyword_spacing_and_case_share_one_name() -> TestResult {
        let a = BuyXGetY::new(2, 1, "polar  pop")?;
        let b = BuyXGetY::new(2, 1, "POLAR POP")?;

        assert_eq!(a.name(), b.name());
        assert_eq!(a.keyword(), "POLAR POP");

        Ok(())
    }
}
