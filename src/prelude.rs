//! Checkout prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    basket::{Basket, BasketError},
    catalog::{CatalogError, RuleCatalog, RuleDefinition, RuleKey, RuleKind},
    discounts::{AffectedItem, DiscountCandidate, DiscountError},
    engine::{Engine, EngineError},
    fixtures::{Fixture, FixtureError},
    items::{BasketItem, ItemId},
    pricing::{PricingError, TaxRate},
    receipt::{AppliedDiscount, Receipt, ReceiptError, ReceiptView},
    rules::{BuyOneGetOne, BuyXGetY, MixAndMatch, PercentOff, Rule, RuleConfigError},
};
