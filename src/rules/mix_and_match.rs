//! Mix and Match Bundle
//!
//! A fixed price for every `required_quantity` units drawn from any lines whose
//! description matches one of a set of keywords.
//!
//! When matched lines carry different unit prices, units are bundled highest price
//! first (ties keep basket order). Any remainder that does not fill a bundle is
//! left at full price and does not count towards the discount.

use rusty_money::{Money, MoneyError, iso::Currency};
use smallvec::{SmallVec, smallvec};

use crate::{
    basket::Basket,
    discounts::{AffectedItem, DiscountCandidate, DiscountError},
    items::BasketItem,
    rules::{RuleConfigError, match_keys, name_fragment, require_text, set_fragment, times},
};

/// Brand keywords for the default energy drink bundle.
pub const ENERGY_DRINK_KEYWORDS: [&str; 9] = [
    "MONSTER",
    "RED BULL",
    "ROCKSTAR",
    "NOS",
    "REIGN",
    "CELSIUS",
    "BANG",
    "5 HR",
    "GHOST ERGY",
];

/// Mix-and-match bundle promotion.
#[derive(Debug, Clone)]
pub struct MixAndMatch<'a> {
    name: String,
    label: String,
    keywords: SmallVec<[String; 10]>,
    required_quantity: u32,
    bundle_price: Money<'a, Currency>,
}

impl<'a> MixAndMatch<'a> {
    /// Create a new mix-and-match bundle.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleConfigError`] if the label is blank, no keyword is given, the
    /// required quantity is zero or the bundle price is not positive.
    pub fn new<I, S>(
        label: impl AsRef<str>,
        keywords: I,
        required_quantity: u32,
        bundle_price: Money<'a, Currency>,
    ) -> Result<Self, RuleConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let label = require_text(label.as_ref(), "label")?;

        let keywords: SmallVec<[String; 10]> = match_keys(keywords).into_iter().collect();

        if keywords.is_empty() {
            return Err(RuleConfigError::Missing { field: "keywords" });
        }

        if required_quantity == 0 {
            return Err(RuleConfigError::NotPositive {
                field: "required_quantity",
            });
        }

        if bundle_price.to_minor_units() <= 0 {
            return Err(RuleConfigError::NotPositive {
                field: "bundle_price",
            });
        }

        Ok(Self::build(label, keywords, required_quantity, bundle_price))
    }

    /// The energy drink bundle: any 2 for 6.00.
    pub fn energy_drinks(currency: &'a Currency) -> Self {
        Self::build(
            "ENERGY".to_string(),
            ENERGY_DRINK_KEYWORDS
                .iter()
                .map(ToString::to_string)
                .collect(),
            2,
            Money::from_minor(600, currency),
        )
    }

    /// The name carries the keyword set, so bundles that differ only in what they
    /// match never share a name.
    fn build(
        label: String,
        keywords: SmallVec<[String; 10]>,
        required_quantity: u32,
        bundle_price: Money<'a, Currency>,
    ) -> Self {
        Self {
            name: format!(
                "MIX_MATCH_{}_{required_quantity}FOR{}__{}",
                name_fragment(&label),
                bundle_price.amount(),
                set_fragment(&keywords)
            ),
            label,
            keywords,
            required_quantity,
            bundle_price,
        }
    }

    /// Rule name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Keyword match keys
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Units per bundle
    pub fn required_quantity(&self) -> u32 {
        self.required_quantity
    }

    /// Price charged per bundle
    pub fn bundle_price(&self) -> &Money<'a, Currency> {
        &self.bundle_price
    }

    /// True if the item's description contains any keyword.
    pub fn matches(&self, item: &BasketItem<'_>) -> bool {
        self.keywords
            .iter()
            .any(|keyword| item.description_contains(keyword))
    }

    /// Evaluate against a basket.
    ///
    /// # Errors
    ///
    /// Returns a [`DiscountError`] on overflow or if the bundle price is in a
    /// different currency to the basket.
    pub fn evaluate(&self, basket: &Basket<'a>) -> Result<DiscountCandidate<'a>, DiscountError> {
        if self.bundle_price.currency() != basket.currency() {
            return Err(DiscountError::Money(MoneyError::CurrencyMismatch {
                expected: basket.currency().iso_alpha_code,
                actual: self.bundle_price.currency().iso_alpha_code,
            }));
        }

        let mut matched: SmallVec<[&BasketItem<'a>; 8]> =
            basket.iter().filter(|item| self.matches(item)).collect();

        let total_quantity: u64 = matched.iter().map(|item| u64::from(item.quantity())).sum();
        let bundles = total_quantity / u64::from(self.required_quantity);

        if bundles == 0 {
            return Ok(DiscountCandidate::none(&self.name, basket.currency()));
        }

        // Stable: equal prices keep basket order.
        matched.sort_by_key(|item| std::cmp::Reverse(item.unit_minor()));

        let mut remaining = bundles
            .checked_mul(u64::from(self.required_quantity))
            .ok_or(DiscountError::Overflow)?;

        let mut regular_minor = 0i64;
        let mut affected: SmallVec<[AffectedItem; 4]> = smallvec![];

        for item in matched {
            if remaining == 0 {
                break;
            }

            let taken = remaining.min(u64::from(item.quantity()));
            remaining -= taken;

            regular_minor = regular_minor
                .checked_add(times(item.unit_minor(), taken)?)
                .ok_or(DiscountError::Overflow)?;

            affected.push(AffectedItem {
                item_id: item.id().clone(),
                description: item.description().to_string(),
            });
        }

        let bundled_minor = times(self.bundle_price.to_minor_units(), bundles)?;
        let discount_minor = regular_minor
            .checked_sub(bundled_minor)
            .ok_or(DiscountError::Overflow)?;

        if discount_minor <= 0 {
            return Ok(DiscountCandidate::none(&self.name, basket.currency()));
        }

        Ok(DiscountCandidate::new(
            &self.name,
            format!(
                "{} for {} on {}",
                self.required_quantity, self.bundle_price, self.label
            ),
            Money::from_minor(discount_minor, basket.currency()),
            affected,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{GBP, USD};
    use testresult::TestResult;

    use super::*;

    const ENERGY_BUNDLE_NAME: &str = "MIX_MATCH_ENERGY_2FOR6.00__5_HR__BANG__CELSIUS__GHOST_ERGY__MONSTER__NOS__RED_BULL__REIGN__ROCKSTAR";

    fn drink<'a>(id: &str, description: &str, minor: i64, quantity: u32) -> BasketItem<'a> {
        BasketItem::new(id, description, Money::from_minor(minor, USD), quantity, "BEVERAGE")
    }

    #[test]
    fn two_energy_drinks_for_six() -> TestResult {
        let basket = Basket::with_items([drink("1", "Monster Energy", 399, 2)], USD)?;

        let candidate = MixAndMatch::energy_drinks(USD).evaluate(&basket)?;

        assert_eq!(candidate.amount(), &Money::from_minor(198, USD));
        assert_eq!(candidate.rule_name(), ENERGY_BUNDLE_NAME);

        Ok(())
    }

    #[test]
    fn mixed_brands_bundle_together() -> TestResult {
        let basket = Basket::with_items(
            [
                drink("1", "Monster Energy", 399, 1),
                drink("2", "Red Bull 12oz", 429, 1),
                drink("3", "Coke", 200, 4),
            ],
            USD,
        )?;

        let candidate = MixAndMatch::energy_drinks(USD).evaluate(&basket)?;

        // 3.99 + 4.29 - 6.00
        assert_eq!(candidate.amount(), &Money::from_minor(228, USD));
        assert_eq!(candidate.affected_items().len(), 2);

        Ok(())
    }

    #[test]
    fn highest_priced_units_are_bundled_first() -> TestResult {
        // Three units, one bundle of two: the 3.00 unit stays at full price.
        let basket = Basket::with_items(
            [
                drink("1", "Bang Energy", 300, 1),
                drink("2", "Reign Total Body", 350, 1),
                drink("3", "Celsius", 400, 1),
            ],
            USD,
        )?;

        let candidate = MixAndMatch::energy_drinks(USD).evaluate(&basket)?;

        // 4.00 + 3.50 - 6.00
        assert_eq!(candidate.amount(), &Money::from_minor(150, USD));

        let ids: Vec<&str> = candidate
            .affected_items()
            .iter()
            .map(|a| a.item_id.as_str())
            .collect();

        assert_eq!(ids, ["3", "2"]);

        Ok(())
    }

    #[test]
    fn bundling_spans_line_quantities() -> TestResult {
        let basket = Basket::with_items(
            [drink("1", "Rockstar", 300, 3), drink("2", "NOS", 350, 2)],
            USD,
        )?;

        let candidate = MixAndMatch::energy_drinks(USD).evaluate(&basket)?;

        // two bundles: 3.50 + 3.50 + 3.00 + 3.00 - 12.00
        assert_eq!(candidate.amount(), &Money::from_minor(100, USD));

        Ok(())
    }

    #[test]
    fn bundle_price_above_regular_is_zero() -> TestResult {
        let basket = Basket::with_items([drink("1", "Monster", 250, 2)], USD)?;

        let candidate = MixAndMatch::energy_drinks(USD).evaluate(&basket)?;

        assert!(!candidate.is_applicable());

        Ok(())
    }

    #[test]
    fn single_unit_forms_no_bundle() -> TestResult {
        let basket = Basket::with_items([drink("1", "Monster", 399, 1)], USD)?;

        let candidate = MixAndMatch::energy_drinks(USD).evaluate(&basket)?;

        assert!(!candidate.is_applicable());

        Ok(())
    }

    #[test]
    fn custom_bundle_is_named_from_configuration() -> TestResult {
        let rule = MixAndMatch::new(
            "candy bars",
            ["snickers", "Twix"],
            3,
            Money::from_minor(400, USD),
        )?;

        assert_eq!(rule.name(), "MIX_MATCH_CANDY_BARS_3FOR4.00__SNICKERS__TWIX");
        assert_eq!(rule.keywords(), ["SNICKERS", "TWIX"]);

        Ok(())
    }

    #[test]
    fn bundles_matching_different_brands_are_named_apart() -> TestResult {
        let monster = MixAndMatch::new("DRINKS", ["MONSTER"], 2, Money::from_minor(500, USD))?;
        let red_bull = MixAndMatch::new("DRINKS", ["RED BULL"], 2, Money::from_minor(500, USD))?;

        assert_ne!(monster.name(), red_bull.name());

        let reordered = MixAndMatch::new(
            "drinks",
            ["red  bull", "Monster", "MONSTER"],
            2,
            Money::from_minor(500, USD),
        )?;
        let both = MixAndMatch::new("DRINKS", ["MONSTER", "RED BULL"], 2, Money::from_minor(500, USD))?;

        assert_eq!(reordered.name(), both.name());
        assert_eq!(both.name(), "MIX_MATCH_DRINKS_2FOR5.00__MONSTER__RED_BULL");

        Ok(())
    }

    #[test]
    fn bundle_currency_mismatch_errors() -> TestResult {
        let rule = MixAndMatch::energy_drinks(GBP);
        let basket = Basket::with_items([drink("1", "Monster", 399, 2)], USD)?;

        assert!(matches!(rule.evaluate(&basket), Err(DiscountError::Money(_))));

        Ok(())
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let price = Money::from_minor(600, USD);

        assert_eq!(
            MixAndMatch::new("ENERGY", ["MONSTER"], 0, price).err(),
            Some(RuleConfigError::NotPositive {
                field: "required_quantity"
            })
        );
        assert_eq!(
            MixAndMatch::new("ENERGY", ["MONSTER"], 2, Money::from_minor(0, USD)).err(),
            Some(RuleConfigError::NotPositive {
                field: "bundle_price"
            })
        );
        assert_eq!(
            MixAndMatch::new("ENERGY", Vec::<String>::new(), 2, price).err(),
            Some(RuleConfigError::Missing { field: "keywords" })
        );
    }
}
