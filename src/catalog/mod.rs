//! Rule Catalog
//!
//! In-memory management of named rule definitions. The catalog owns definitions;
//! the engine only ever sees the [`Rule`]s produced by [`RuleCatalog::active_rules`].

use std::cmp::Reverse;

use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use slotmap::{SlotMap, new_key_type};
use thiserror::Error;
use tracing::debug;

use crate::{
    pricing::PricingError,
    rules::{Rule, RuleConfigError},
};

mod definition;

pub use definition::*;

new_key_type! {
    /// Rule Definition Key
    pub struct RuleKey;
}

/// Errors raised by catalog operations.
#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    /// A definition failed validation.
    #[error("invalid rule definition {name}")]
    InvalidDefinition {
        /// Definition name
        name: String,

        /// Validation failure
        #[source]
        source: RuleConfigError,
    },

    /// Rule configuration error while building a rule.
    #[error(transparent)]
    Config(#[from] RuleConfigError),

    /// Another definition already uses this name.
    #[error("rule definition already exists: {0}")]
    DuplicateName(String),

    /// Two active definitions produce rules with the same name.
    #[error("definitions {first} and {second} both produce rule {rule}")]
    DuplicateRuleName {
        /// Derived rule name
        rule: String,

        /// First definition
        first: String,

        /// Second definition
        second: String,
    },

    /// No definition for the given key.
    #[error("rule definition not found")]
    NotFound,

    /// A bundle price could not be converted.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Named rule definitions, kept in insertion order.
#[derive(Debug, Default)]
pub struct RuleCatalog {
    definitions: SlotMap<RuleKey, RuleDefinition>,
    order: Vec<RuleKey>,
}

impl RuleCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog seeded with the store's standing promotions.
    pub fn with_defaults() -> Self {
        let mut catalog = Self::new();

        for definition in default_definitions() {
            catalog.insert(definition);
        }

        catalog
    }

    /// Add a definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidDefinition`] if validation fails, or
    /// [`CatalogError::DuplicateName`] if the name is taken.
    pub fn create(&mut self, definition: RuleDefinition) -> Result<RuleKey, CatalogError> {
        validate(&definition)?;

        if self.find(&definition.name).is_some() {
            return Err(CatalogError::DuplicateName(definition.name));
        }

        debug!(name = %definition.name, kind = definition.kind.type_name(), "rule definition created");

        Ok(self.insert(definition))
    }

    /// Lookup a definition by key.
    pub fn get(&self, key: RuleKey) -> Option<&RuleDefinition> {
        self.definitions.get(key)
    }

    /// Lookup a definition by name.
    pub fn find(&self, name: &str) -> Option<(RuleKey, &RuleDefinition)> {
        self.iter().find(|(_, definition)| definition.name == name)
    }

    /// Replace a definition.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown key, or a validation or
    /// duplicate-name error.
    pub fn update(&mut self, key: RuleKey, definition: RuleDefinition) -> Result<(), CatalogError> {
        if !self.definitions.contains_key(key) {
            return Err(CatalogError::NotFound);
        }

        validate(&definition)?;

        if self
            .find(&definition.name)
            .is_some_and(|(existing, _)| existing != key)
        {
            return Err(CatalogError::DuplicateName(definition.name));
        }

        let slot = self
            .definitions
            .get_mut(key)
            .ok_or(CatalogError::NotFound)?;

        *slot = definition;

        debug!(name = %slot.name, "rule definition updated");

        Ok(())
    }

    /// Remove a definition, returning it.
    pub fn remove(&mut self, key: RuleKey) -> Option<RuleDefinition> {
        let removed = self.definitions.remove(key)?;

        self.order.retain(|existing| *existing != key);

        debug!(name = %removed.name, "rule definition removed");

        Some(removed)
    }

    /// Flip a definition's active flag, returning the new state.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for an unknown key.
    pub fn toggle_active(&mut self, key: RuleKey) -> Result<bool, CatalogError> {
        let definition = self
            .definitions
            .get_mut(key)
            .ok_or(CatalogError::NotFound)?;

        definition.active = !definition.active;

        debug!(name = %definition.name, active = definition.active, "rule definition toggled");

        Ok(definition.active)
    }

    /// Iterate definitions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (RuleKey, &RuleDefinition)> {
        self.order
            .iter()
            .filter_map(|&key| self.definitions.get(key).map(|definition| (key, definition)))
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog has no definitions.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Build the evaluable rules: active definitions only, highest priority first,
    /// equal priorities in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateRuleName`] if two active definitions produce
    /// the same rule name, or an error if a definition cannot be converted.
    pub fn active_rules<'a>(&self, currency: &'a Currency) -> Result<Vec<Rule<'a>>, CatalogError> {
        let mut active: Vec<&RuleDefinition> = self
            .iter()
            .map(|(_, definition)| definition)
            .filter(|definition| definition.active)
            .collect();

        active.sort_by_key(|definition| Reverse(definition.priority));

        let mut seen: FxHashMap<String, &str> = FxHashMap::default();
        let mut rules = Vec::with_capacity(active.len());

        for definition in active {
            let rule = definition.kind.to_rule(currency)?;

            if let Some(first) = seen.insert(rule.name().to_string(), &definition.name) {
                return Err(CatalogError::DuplicateRuleName {
                    rule: rule.name().to_string(),
                    first: first.to_string(),
                    second: definition.name.clone(),
                });
            }

            rules.push(rule);
        }

        Ok(rules)
    }

    fn insert(&mut self, definition: RuleDefinition) -> RuleKey {
        let key = self.definitions.insert(definition);

        self.order.push(key);

        key
    }
}

fn validate(definition: &RuleDefinition) -> Result<(), CatalogError> {
    definition
        .validate()
        .map_err(|source| CatalogError::InvalidDefinition {
            name: definition.name.clone(),
            source,
        })
}

fn default_definitions() -> [RuleDefinition; 3] {
    [
        RuleDefinition::new(
            "POLAR_POP_BUY2GET1",
            RuleKind::BuyXGetY {
                buy_quantity: Some(2),
                free_quantity: Some(1),
                item_keyword: Some("POLAR POP".to_string()),
            },
        )
        .with_description("Buy 2 Polar Pop, get 1 free")
        .with_priority(100),
        RuleDefinition::new(
            "BEVERAGE_BOGO",
            RuleKind::BuyOneGetOne {
                category: Some("BEVERAGE".to_string()),
            },
        )
        .with_description("Buy one beverage, get one free")
        .with_priority(75),
        RuleDefinition::new(
            "FOOD_5_PERCENT",
            RuleKind::PercentOff {
                percent_off: Some(Decimal::from(5)),
                categories: vec!["FOOD".to_string()],
            },
        )
        .with_description("5% off all food")
        .with_priority(50),
    ]
}
