//! Rule Definitions

use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso::Currency};

use crate::{
    catalog::CatalogError,
    pricing::minor_units_from_decimal,
    rules::{
        BuyOneGetOne, BuyXGetY, ENERGY_DRINK_KEYWORDS, MixAndMatch, PercentOff, Rule,
        RuleConfigError, require_text,
    },
};

/// Bundle prices must be worth at least one minor unit at this many decimal places,
/// the exponent of every currency fixtures accept.
const BUNDLE_PRICE_DP: u32 = 2;

/// Stored configuration for a rule, by type. Fields are optional as stored and are
/// checked by [`RuleKind::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind {
    /// Percentage off a set of categories (empty means every item)
    PercentOff {
        /// Percent points off, e.g. `5` for 5%
        percent_off: Option<Decimal>,

        /// Categories the discount is limited to
        categories: Vec<String>,
    },

    /// Buy one get one free within a category
    BuyOneGetOne {
        /// Category the rule applies to
        category: Option<String>,
    },

    /// Buy X get Y free on the first keyword-matched line
    BuyXGetY {
        /// Units to buy
        buy_quantity: Option<u32>,

        /// Units given free
        free_quantity: Option<u32>,

        /// Description keyword
        item_keyword: Option<String>,
    },

    /// Fixed-price bundle across keyword-matched lines
    MixAndMatch {
        /// Label used in the rule name; defaults to `ENERGY`
        label: Option<String>,

        /// Description keywords; defaults to the energy drink brands
        keywords: Vec<String>,

        /// Units per bundle
        required_quantity: Option<u32>,

        /// Bundle price in major units
        bundle_price: Option<Decimal>,
    },
}

impl RuleKind {
    /// Type tag, as used in fixtures.
    pub fn type_name(&self) -> &'static str {
        match self {
            RuleKind::PercentOff { .. } => "percent_off",
            RuleKind::BuyOneGetOne { .. } => "buy_one_get_one",
            RuleKind::BuyXGetY { .. } => "buy_x_get_y",
            RuleKind::MixAndMatch { .. } => "mix_and_match",
        }
    }

    /// Check that every field the type requires is present and in range.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleConfigError`] naming the first offending field.
    pub fn validate(&self) -> Result<(), RuleConfigError> {
        match self {
            RuleKind::PercentOff { percent_off, .. } => {
                let points = percent_off.ok_or(RuleConfigError::Missing {
                    field: "percent_off",
                })?;

                if points <= Decimal::ZERO || points > Decimal::ONE_HUNDRED {
                    return Err(RuleConfigError::PercentOutOfRange {
                        field: "percent_off",
                    });
                }
            }
            RuleKind::BuyOneGetOne { category } => {
                required_text(category.as_deref(), "category")?;
            }
            RuleKind::BuyXGetY {
                buy_quantity,
                free_quantity,
                item_keyword,
            } => {
                positive(*buy_quantity, "buy_quantity")?;
                positive(*free_quantity, "free_quantity")?;
                required_text(item_keyword.as_deref(), "item_keyword")?;
            }
            RuleKind::MixAndMatch {
                label,
                keywords,
                required_quantity,
                bundle_price,
            } => {
                if let Some(label) = label {
                    require_text(label, "label")?;
                }

                if !keywords.is_empty() && keywords.iter().all(|keyword| keyword.trim().is_empty()) {
                    return Err(RuleConfigError::Blank { field: "keywords" });
                }

                positive(*required_quantity, "required_quantity")?;

                let price = bundle_price.ok_or(RuleConfigError::Missing {
                    field: "bundle_price",
                })?;

                if price.round_dp_with_strategy(BUNDLE_PRICE_DP, RoundingStrategy::MidpointAwayFromZero)
                    <= Decimal::ZERO
                {
                    return Err(RuleConfigError::NotPositive {
                        field: "bundle_price",
                    });
                }
            }
        }

        Ok(())
    }

    /// Build the evaluable rule, pricing bundles in the given currency.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the configuration is invalid or a bundle price
    /// cannot be represented in minor units.
    pub fn to_rule<'a>(&self, currency: &'a Currency) -> Result<Rule<'a>, CatalogError> {
        self.validate()?;

        let rule = match self {
            RuleKind::PercentOff {
                percent_off,
                categories,
            } => {
                let points = percent_off.ok_or(RuleConfigError::Missing {
                    field: "percent_off",
                })?;

                PercentOff::new(points, categories)?.into()
            }
            RuleKind::BuyOneGetOne { category } => {
                BuyOneGetOne::new(required_text(category.as_deref(), "category")?)?.into()
            }
            RuleKind::BuyXGetY {
                buy_quantity,
                free_quantity,
                item_keyword,
            } => BuyXGetY::new(
                positive(*buy_quantity, "buy_quantity")?,
                positive(*free_quantity, "free_quantity")?,
                required_text(item_keyword.as_deref(), "item_keyword")?,
            )?
            .into(),
            RuleKind::MixAndMatch {
                label,
                keywords,
                required_quantity,
                bundle_price,
            } => {
                let price = bundle_price.ok_or(RuleConfigError::Missing {
                    field: "bundle_price",
                })?;

                let bundle_price =
                    Money::from_minor(minor_units_from_decimal(price, currency)?, currency);

                let label = label.as_deref().unwrap_or("ENERGY");
                let required_quantity = positive(*required_quantity, "required_quantity")?;

                if keywords.is_empty() {
                    MixAndMatch::new(label, ENERGY_DRINK_KEYWORDS, required_quantity, bundle_price)?
                        .into()
                } else {
                    MixAndMatch::new(label, keywords, required_quantity, bundle_price)?.into()
                }
            }
        };

        Ok(rule)
    }
}

/// A named, prioritised rule configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDefinition {
    /// Unique definition name, e.g. `BEVERAGE_BOGO`
    pub name: String,

    /// Optional free-text description
    pub description: Option<String>,

    /// Rule configuration
    pub kind: RuleKind,

    /// Inactive definitions are kept but never evaluated
    pub active: bool,

    /// Higher priorities are evaluated first
    pub priority: i32,
}

impl RuleDefinition {
    /// Create an active definition with priority 0.
    pub fn new(name: impl Into<String>, kind: RuleKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            kind,
            active: true,
            priority: 0,
        }
    }

    /// Set the priority.
    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set whether the definition is active.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Validate the name and rule configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`RuleConfigError`] naming the offending field.
    pub fn validate(&self) -> Result<(), RuleConfigError> {
        require_text(&self.name, "name")?;

        self.kind.validate()
    }
}

fn required_text<'s>(
    value: Option<&'s str>,
    field: &'static str,
) -> Result<&'s str, RuleConfigError> {
    let value = value.ok_or(RuleConfigError::Missing { field })?;

    if value.trim().is_empty() {
        return Err(RuleConfigError::Blank { field });
    }

    Ok(value)
}

fn positive(value: Option<u32>, field: &'static str) -> Result<u32, RuleConfigError> {
    match value {
        None => Err(RuleConfigError::Missing { field }),
        Some(0) => Err(RuleConfigError::NotPositive { field }),
        Some(value) => Ok(value),
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use super::*;

    fn bundle(bundle_price: Option<Decimal>) -> RuleKind {
        RuleKind::MixAndMatch {
            label: None,
            keywords: Vec::new(),
            required_quantity: Some(2),
            bundle_price,
        }
    }

    #[test]
    fn percent_off_must_be_in_range() {
        let kind = |points| RuleKind::PercentOff {
            percent_off: Some(points),
            categories: vec!["FOOD".to_string()],
        };

        assert!(kind(Decimal::from(100)).validate().is_ok());
        assert_eq!(
            kind(Decimal::ZERO).validate().err().map(|e| e.field()),
            Some("percent_off")
        );
        assert_eq!(
            kind(Decimal::from(101)).validate(),
            Err(RuleConfigError::PercentOutOfRange {
                field: "percent_off"
            })
        );
    }

    #[test]
    fn missing_fields_are_named() {
        assert_eq!(
            RuleKind::BuyOneGetOne { category: None }.validate(),
            Err(RuleConfigError::Missing { field: "category" })
        );
        assert_eq!(
            RuleKind::BuyXGetY {
                buy_quantity: Some(2),
                free_quantity: None,
                item_keyword: Some("POLAR POP".to_string()),
            }
            .validate(),
            Err(RuleConfigError::Missing {
                field: "free_quantity"
            })
        );
        assert_eq!(
            bundle(None).validate(),
            Err(RuleConfigError::Missing {
                field: "bundle_price"
            })
        );
    }

    #[test]
    fn blank_and_non_positive_fields_are_rejected() {
        assert_eq!(
            RuleKind::BuyOneGetOne {
                category: Some("  ".to_string())
            }
            .validate(),
            Err(RuleConfigError::Blank { field: "category" })
        );
        assert_eq!(
            bundle(Some(Decimal::ZERO)).validate(),
            Err(RuleConfigError::NotPositive {
                field: "bundle_price"
            })
        );
        assert_eq!(
            RuleDefinition::new(" ", RuleKind::BuyOneGetOne {
                category: Some("BEVERAGE".to_string())
            })
            .validate(),
            Err(RuleConfigError::Blank { field: "name" })
        );
    }

    #[test]
    fn mix_and_match_defaults_to_energy_drinks() -> TestResult {
        let rule = bundle(Some(Decimal::from(6))).to_rule(USD)?;

        assert_eq!(rule.name(), MixAndMatch::energy_drinks(USD).name());
        assert!(rule.name().starts_with("MIX_MATCH_ENERGY_2FOR6.00__"));

        Ok(())
    }

    #[test]
    fn percent_off_without_categories_applies_to_all() -> TestResult {
        let rule = RuleKind::PercentOff {
            percent_off: Some(Decimal::from(5)),
            categories: Vec::new(),
        }
        .to_rule(USD)?;

        assert_eq!(rule.name(), "PERCENT_OFF_5_ALL");

        Ok(())
    }

    #[test]
    fn bundle_keywords_and_price_are_checked_before_conversion() {
        let kind = |keywords: Vec<String>, price| RuleKind::MixAndMatch {
            label: Some("DRINKS".to_string()),
            keywords,
            required_quantity: Some(2),
            bundle_price: Some(price),
        };

        assert_eq!(
            kind(vec!["  ".to_string(), String::new()], Decimal::from(5)).validate(),
            Err(RuleConfigError::Blank { field: "keywords" })
        );
        assert_eq!(
            kind(vec!["MONSTER".to_string()], Decimal::new(4, 3)).validate(),
            Err(RuleConfigError::NotPositive {
                field: "bundle_price"
            })
        );
        assert!(kind(vec!["MONSTER".to_string(), " ".to_string()], Decimal::from(5))
            .validate()
            .is_ok());
    }

    #[test]
    fn to_rule_reports_invalid_configuration() {
        let result = RuleKind::BuyXGetY {
            buy_quantity: Some(0),
            free_quantity: Some(1),
            item_keyword: Some("POLAR POP".to_string()),
        }
        .to_rule(USD);

        assert!(matches!(
            result,
            Err(CatalogError::Config(RuleConfigError::NotPositive {
                field: "buy_quantity"
            }))
        ));
    }
}
