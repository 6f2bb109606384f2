//! Fixtures
//!
//! YAML rule sets and baskets, loaded from `<base>/rules/<name>.yml` and
//! `<base>/baskets/<name>.yml`.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    basket::{Basket, BasketError},
    catalog::{CatalogError, RuleCatalog},
    fixtures::{baskets::BasketFixture, rules::RulesFixture},
    pricing::PricingError,
};

pub mod baskets;
pub mod rules;

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Invalid percentage format
    #[error("Invalid percentage: {0}")]
    InvalidPercentage(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Rule definition rejected by the catalog
    #[error("Invalid rule fixture: {0}")]
    Catalog(#[from] CatalogError),

    /// Basket creation error
    #[error("Failed to create basket: {0}")]
    Basket(#[from] BasketError),

    /// Price conversion error
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Fixture loader rooted at a base directory.
#[derive(Debug, Clone)]
pub struct Fixture {
    /// Base path for fixture files
    base_path: PathBuf,
}

impl Default for Fixture {
    fn default() -> Self {
        Self::new()
    }
}

impl Fixture {
    /// Create a fixture loader with the default base path
    pub fn new() -> Self {
        Self::with_base_path("./fixtures")
    }

    /// Create a fixture loader with a custom base path
    pub fn with_base_path(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Load a rule set into a fresh catalog
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or a definition is rejected.
    pub fn load_rules(&self, name: &str) -> Result<RuleCatalog, FixtureError> {
        load_rules(self.base_path.join("rules").join(format!("{name}.yml")))
    }

    /// Load a basket
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or the basket is invalid.
    pub fn load_basket(&self, name: &str) -> Result<Basket<'static>, FixtureError> {
        load_basket(self.base_path.join("baskets").join(format!("{name}.yml")))
    }
}

/// Load a rule set from an explicit path
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or a definition is rejected.
pub fn load_rules(path: impl AsRef<Path>) -> Result<RuleCatalog, FixtureError> {
    let contents = fs::read_to_string(path)?;
    let fixture: RulesFixture = serde_norway::from_str(&contents)?;

    fixture.try_into_catalog()
}

/// Load a basket from an explicit path
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or the basket is invalid.
pub fn load_basket(path: impl AsRef<Path>) -> Result<Basket<'static>, FixtureError> {
    let contents = fs::read_to_string(path)?;
    let fixture: BasketFixture = serde_norway::from_str(&contents)?;

    fixture.try_into_basket()
}
