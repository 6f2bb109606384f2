//! Discount Engine
//!
//! Evaluates every configured rule against a basket, resolves conflicts so each
//! basket item receives at most one discount, and prices the result.
//!
//! Conflict resolution is per item: every applicable candidate bids for each item it
//! affects, and the candidate with the strictly greatest *total* amount keeps the
//! item. On ties the earlier rule in evaluation order wins. The winning candidates'
//! full amounts are then summed, deduplicated by rule name.

use std::collections::hash_map::Entry;

use rusty_money::{Money, MoneyError, iso::Currency};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    basket::Basket,
    discounts::{DiscountCandidate, DiscountError},
    items::ItemId,
    pricing::{PricingError, TaxRate},
    receipt::{AppliedDiscount, Receipt},
    rules::Rule,
};

/// Errors raised while calculating a receipt.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule failed to evaluate; the whole calculation is aborted.
    #[error("rule {rule} failed to evaluate")]
    Rule {
        /// Name of the failing rule
        rule: String,

        /// Underlying evaluation error
        #[source]
        source: DiscountError,
    },

    /// Wrapped pricing error
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Wrapped money error
    #[error(transparent)]
    Money(#[from] MoneyError),
}

/// Ordered rule set plus the tax rate applied to the discounted subtotal.
#[derive(Debug, Clone, Default)]
pub struct Engine<'a> {
    rules: Vec<Rule<'a>>,
    tax_rate: TaxRate,
}

impl<'a> Engine<'a> {
    /// Create an engine with no rules and the default tax rate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine from an ordered list of rules.
    #[must_use]
    pub fn with_rules(rules: impl Into<Vec<Rule<'a>>>) -> Self {
        Self {
            rules: rules.into(),
            tax_rate: TaxRate::default(),
        }
    }

    /// Append a rule; evaluation order is insertion order.
    #[must_use]
    pub fn with_rule(mut self, rule: impl Into<Rule<'a>>) -> Self {
        self.rules.push(rule.into());
        self
    }

    /// Replace the tax rate.
    #[must_use]
    pub fn with_tax_rate(mut self, tax_rate: TaxRate) -> Self {
        self.tax_rate = tax_rate;
        self
    }

    /// Append a rule in place.
    pub fn add_rule(&mut self, rule: impl Into<Rule<'a>>) {
        self.rules.push(rule.into());
    }

    /// Configured rules, in evaluation order.
    pub fn rules(&self) -> &[Rule<'a>] {
        &self.rules
    }

    /// Tax rate charged on the discounted subtotal.
    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    /// Evaluate all rules, resolve conflicts and price the basket.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Rule`] if any rule fails to evaluate, or a pricing
    /// error if an amount overflows.
    #[tracing::instrument(
        name = "engine.calculate",
        skip_all,
        fields(items = basket.len(), rules = self.rules.len())
    )]
    pub fn calculate(&self, basket: &Basket<'a>) -> Result<Receipt<'a>, EngineError> {
        let original_subtotal = basket.subtotal()?;

        let candidates = self.evaluate_rules(basket)?;
        let winners = resolve_conflicts(basket, &candidates);
        let (applied, item_discounts) = collect_applied(&candidates, &winners);

        price(
            original_subtotal,
            applied,
            item_discounts,
            self.tax_rate,
            basket.currency(),
        )
    }

    fn evaluate_rules(&self, basket: &Basket<'a>) -> Result<Vec<DiscountCandidate<'a>>, EngineError> {
        let mut candidates = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            let candidate = rule.evaluate(basket).map_err(|source| EngineError::Rule {
                rule: rule.name().to_string(),
                source,
            })?;

            if !candidate.is_applicable() {
                debug!(rule = rule.name(), "rule not applicable");
                continue;
            }

            debug!(
                rule = rule.name(),
                amount = %candidate.amount(),
                affected = candidate.affected_items().len(),
                "candidate discount"
            );

            candidates.push(candidate);
        }

        Ok(candidates)
    }
}

/// Maps each basket item to the index of the candidate that wins it.
fn resolve_conflicts(
    basket: &Basket<'_>,
    candidates: &[DiscountCandidate<'_>],
) -> FxHashMap<ItemId, usize> {
    let mut best: FxHashMap<ItemId, usize> = FxHashMap::default();

    for (idx, candidate) in candidates.iter().enumerate() {
        let amount = candidate.amount().to_minor_units();

        for affected in candidate.affected_items() {
            if basket.get(&affected.item_id).is_none() {
                warn!(
                    rule = candidate.rule_name(),
                    item = %affected.item_id,
                    "affected item not in basket, skipping"
                );
                continue;
            }

            match best.entry(affected.item_id.clone()) {
                Entry::Vacant(entry) => {
                    entry.insert(idx);
                }
                Entry::Occupied(mut entry) => {
                    let current = candidates
                        .get(*entry.get())
                        .map_or(i64::MIN, |winner| winner.amount().to_minor_units());

                    // Strictly greater: ties stay with the earlier rule.
                    if amount > current {
                        entry.insert(idx);
                    }
                }
            }
        }
    }

    best
}

/// Builds the applied discount list, in evaluation order and unique by rule name,
/// plus the item attribution into that list.
fn collect_applied<'a>(
    candidates: &[DiscountCandidate<'a>],
    winners: &FxHashMap<ItemId, usize>,
) -> (Vec<AppliedDiscount<'a>>, FxHashMap<ItemId, usize>) {
    let mut winning: Vec<usize> = winners.values().copied().collect();

    winning.sort_unstable();
    winning.dedup();

    let mut applied: Vec<AppliedDiscount<'a>> = Vec::with_capacity(winning.len());
    let mut by_name: FxHashMap<&str, usize> = FxHashMap::default();
    let mut by_candidate: FxHashMap<usize, usize> = FxHashMap::default();

    for idx in winning {
        let Some(candidate) = candidates.get(idx) else {
            continue;
        };

        let applied_idx = *by_name.entry(candidate.rule_name()).or_insert_with(|| {
            applied.push(AppliedDiscount::from(candidate));
            applied.len() - 1
        });

        by_candidate.insert(idx, applied_idx);
    }

    let item_discounts = winners
        .iter()
        .filter_map(|(item_id, idx)| {
            by_candidate
                .get(idx)
                .map(|&applied_idx| (item_id.clone(), applied_idx))
        })
        .collect();

    (applied, item_discounts)
}

/// Sums the applied discounts and derives subtotal, tax and total.
fn price<'a>(
    original_subtotal: Money<'a, Currency>,
    applied: Vec<AppliedDiscount<'a>>,
    item_discounts: FxHashMap<ItemId, usize>,
    tax_rate: TaxRate,
    currency: &'static Currency,
) -> Result<Receipt<'a>, EngineError> {
    let original_minor = original_subtotal.to_minor_units();

    let summed_minor = applied.iter().try_fold(0i64, |acc, discount| {
        acc.checked_add(discount.amount.to_minor_units())
            .ok_or(PricingError::Overflow)
    })?;

    let discount_minor = if summed_minor > original_minor {
        warn!(
            discount = summed_minor,
            subtotal = original_minor,
            "total discount exceeds subtotal, clamping"
        );

        original_minor
    } else {
        summed_minor
    };

    let total_discount = Money::from_minor(discount_minor, currency);
    let subtotal = Money::from_minor(original_minor - discount_minor, currency);
    let tax = tax_rate.tax_on(&subtotal)?;
    let total = subtotal.add(tax)?;

    debug!(
        original = %original_subtotal,
        discount = %total_discount,
        %subtotal,
        %tax,
        %total,
        applied = applied.len(),
        "basket priced"
    );

    Ok(Receipt::new(
        original_subtotal,
        subtotal,
        total_discount,
        tax,
        total,
        applied,
        item_discounts,
        currency,
    ))
}
