//! Rule Fixtures

use rust_decimal::{Decimal, prelude::FromPrimitive};
use serde::Deserialize;

use crate::{
    catalog::{RuleCatalog, RuleDefinition, RuleKind},
    fixtures::FixtureError,
};

/// Wrapper for rule definitions in YAML
#[derive(Debug, Deserialize)]
pub struct RulesFixture {
    /// Rule definitions, in insertion order
    pub rules: Vec<RuleFixture>,
}

impl RulesFixture {
    /// Create every definition in a fresh catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if a definition is malformed, invalid or reuses a name.
    pub fn try_into_catalog(self) -> Result<RuleCatalog, FixtureError> {
        let mut catalog = RuleCatalog::new();

        for rule in self.rules {
            catalog.create(rule.try_into_definition()?)?;
        }

        Ok(catalog)
    }
}

/// Rule definition from YAML
#[derive(Debug, Deserialize)]
pub struct RuleFixture {
    /// Definition name
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Whether the rule is evaluated
    #[serde(default = "active_by_default")]
    pub active: bool,

    /// Evaluation priority, highest first
    #[serde(default)]
    pub priority: i32,

    /// Type-specific configuration
    #[serde(flatten)]
    pub config: RuleConfigFixture,
}

/// Type-specific rule configuration from YAML
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleConfigFixture {
    /// Percentage off categories
    PercentOff {
        /// Percent points, e.g. `5` for 5%
        percent_off: Option<f64>,

        /// Categories (omit for every item)
        #[serde(default)]
        categories: Vec<String>,
    },

    /// Buy one get one free
    BuyOneGetOne {
        /// Category
        category: Option<String>,
    },

    /// Buy X get Y free
    BuyXGetY {
        /// Units to buy
        buy_quantity: Option<u32>,

        /// Units free
        free_quantity: Option<u32>,

        /// Description keyword
        item_keyword: Option<String>,
    },

    /// Mix-and-match bundle
    MixAndMatch {
        /// Bundle label
        label: Option<String>,

        /// Description keywords
        #[serde(default)]
        keywords: Vec<String>,

        /// Units per bundle
        required_quantity: Option<u32>,

        /// Bundle price string (e.g. "6.00")
        bundle_price: Option<String>,
    },
}

impl RuleFixture {
    /// Convert to a catalog definition
    ///
    /// # Errors
    ///
    /// Returns an error if a percentage or price cannot be parsed.
    pub fn try_into_definition(self) -> Result<RuleDefinition, FixtureError> {
        let kind = match self.config {
            RuleConfigFixture::PercentOff {
                percent_off,
                categories,
            } => RuleKind::PercentOff {
                percent_off: percent_off.map(parse_points).transpose()?,
                categories,
            },
            RuleConfigFixture::BuyOneGetOne { category } => RuleKind::BuyOneGetOne { category },
            RuleConfigFixture::BuyXGetY {
                buy_quantity,
                free_quantity,
                item_keyword,
            } => RuleKind::BuyXGetY {
                buy_quantity,
                free_quantity,
                item_keyword,
            },
            RuleConfigFixture::MixAndMatch {
                label,
                keywords,
                required_quantity,
                bundle_price,
            } => RuleKind::MixAndMatch {
                label,
                keywords,
                required_quantity,
                bundle_price: bundle_price.as_deref().map(parse_amount).transpose()?,
            },
        };

        Ok(RuleDefinition {
            name: self.name,
            description: self.description,
            kind,
            active: self.active,
            priority: self.priority,
        })
    }
}

fn active_by_default() -> bool {
    true
}

fn parse_points(points: f64) -> Result<Decimal, FixtureError> {
    Decimal::from_f64(points)
        .map(|points| points.normalize())
        .ok_or_else(|| FixtureError::InvalidPercentage(points.to_string()))
}

/// Parse a decimal amount string such as `"6.00"`.
pub(crate) fn parse_amount(s: &str) -> Result<Decimal, FixtureError> {
    s.trim()
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))
}
