//! Receipt
//!
//! The priced result of one evaluation. `subtotal` is the discounted subtotal; the
//! pre-discount figure is kept alongside as `original_subtotal`. Tax is always
//! charged on the discounted subtotal, so `total == subtotal + tax`.

use std::{fmt::Write, io};

use decimal_percentage::Percentage;
use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use rustc_hash::FxHashMap;
use rusty_money::{Money, MoneyError, iso::Currency};
use serde::Serialize;
use smallvec::SmallVec;
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    basket::Basket,
    discounts::{AffectedItem, DiscountCandidate},
    items::ItemId,
};

/// Errors that can occur when reporting a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Wrapper for money errors.
    #[error(transparent)]
    Money(#[from] MoneyError),

    /// JSON encoding error
    #[error("failed to encode receipt: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error")]
    IO,
}

/// A discount that won conflict resolution for at least one item.
#[derive(Debug, Clone)]
pub struct AppliedDiscount<'a> {
    /// Name of the winning rule (unique within a receipt)
    pub rule_name: String,

    /// Human-readable description
    pub description: String,

    /// Amount the rule discounts across all of its affected items
    pub amount: Money<'a, Currency>,

    /// Lines the amount was computed from
    pub affected_items: SmallVec<[AffectedItem; 4]>,
}

impl<'a> From<&DiscountCandidate<'a>> for AppliedDiscount<'a> {
    fn from(candidate: &DiscountCandidate<'a>) -> Self {
        Self {
            rule_name: candidate.rule_name().to_string(),
            description: candidate.description().to_string(),
            amount: *candidate.amount(),
            affected_items: candidate.affected_items().iter().cloned().collect(),
        }
    }
}

/// Final priced result for a basket.
#[derive(Debug, Clone)]
pub struct Receipt<'a> {
    /// Σ price × quantity before any discount
    original_subtotal: Money<'a, Currency>,

    /// Original subtotal less the total discount
    subtotal: Money<'a, Currency>,

    /// Sum of the applied discounts
    total_discount: Money<'a, Currency>,

    /// Tax on the discounted subtotal
    tax: Money<'a, Currency>,

    /// Discounted subtotal plus tax
    total: Money<'a, Currency>,

    /// Winning discounts, in rule evaluation order
    applied_discounts: Vec<AppliedDiscount<'a>>,

    /// Basket item id -> index into `applied_discounts` of the rule that won it
    item_discounts: FxHashMap<ItemId, usize>,

    /// Currency used for all monetary values
    currency: &'static Currency,
}

impl<'a> Receipt<'a> {
    /// Create a new receipt with the given details.
    #[must_use]
    #[expect(clippy::too_many_arguments, reason = "plain value constructor")]
    pub fn new(
        original_subtotal: Money<'a, Currency>,
        subtotal: Money<'a, Currency>,
        total_discount: Money<'a, Currency>,
        tax: Money<'a, Currency>,
        total: Money<'a, Currency>,
        applied_discounts: Vec<AppliedDiscount<'a>>,
        item_discounts: FxHashMap<ItemId, usize>,
        currency: &'static Currency,
    ) -> Self {
        Self {
            original_subtotal,
            subtotal,
            total_discount,
            tax,
            total,
            applied_discounts,
            item_discounts,
            currency,
        }
    }

    /// Total before any discount
    #[must_use]
    pub fn original_subtotal(&self) -> Money<'a, Currency> {
        self.original_subtotal
    }

    /// Subtotal after discounts; the amount tax is charged on
    #[must_use]
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Sum of all applied discounts
    #[must_use]
    pub fn total_discount(&self) -> Money<'a, Currency> {
        self.total_discount
    }

    /// Tax charged
    #[must_use]
    pub fn tax(&self) -> Money<'a, Currency> {
        self.tax
    }

    /// Amount payable
    #[must_use]
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Winning discounts, deduplicated by rule name.
    #[must_use]
    pub fn applied_discounts(&self) -> &[AppliedDiscount<'a>] {
        &self.applied_discounts
    }

    /// Lookup the discount that won a given basket item.
    pub fn discount_for_item(&self, item_id: &ItemId) -> Option<&AppliedDiscount<'a>> {
        self.item_discounts
            .get(item_id)
            .and_then(|&idx| self.applied_discounts.get(idx))
    }

    /// Currency used for all monetary values.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Calculates the total discount as a percentage of the original subtotal.
    pub fn savings_percent(&self) -> Percentage {
        let savings_minor = self.total_discount.to_minor_units();
        let subtotal_minor = self.original_subtotal.to_minor_units();

        if subtotal_minor == 0 {
            return Percentage::from(0.0);
        }

        let savings_dec = Decimal::from_i64(savings_minor).unwrap_or(Decimal::ZERO);
        let subtotal_dec = Decimal::from_i64(subtotal_minor).unwrap_or(Decimal::ZERO);

        Percentage::from(savings_dec / subtotal_dec)
    }

    /// Writes the receipt as a table followed by a summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write, basket: &Basket<'_>) -> Result<(), ReceiptError> {
        let mut builder = Builder::default();

        builder.push_record([
            "", "Item", "Category", "Qty", "Price", "Line Total", "Discount",
        ]);

        let mut color_ops: SmallVec<[(usize, usize, Color); 32]> = SmallVec::new();

        for (idx, item) in basket.iter().enumerate() {
            let row = idx + 1;
            let line_total = item
                .line_total_minor()
                .map(|minor| Money::from_minor(minor, item.price().currency()));

            let discount = self
                .discount_for_item(item.id())
                .map(|applied| applied.rule_name.clone())
                .unwrap_or_default();

            if !discount.is_empty() {
                color_ops.push((row, 6, Color::FG_GREEN));
            }

            color_ops.push((row, 2, color_dark_grey()));

            builder.push_record([
                format!("#{:<3}", idx + 1),
                item.description().to_string(),
                item.category().to_string(),
                item.quantity().to_string(),
                item.price().to_string(),
                line_total.as_ref().map(ToString::to_string).unwrap_or_default(),
                discount,
            ]);
        }

        write_table(&mut out, builder, color_ops)?;

        if !self.applied_discounts.is_empty() {
            let mut builder = Builder::default();

            builder.push_record(["Promotion", "Description", "Savings"]);

            for applied in &self.applied_discounts {
                builder.push_record([
                    applied.rule_name.clone(),
                    applied.description.clone(),
                    format!("-{}", applied.amount),
                ]);
            }

            write_table(&mut out, builder, SmallVec::new())?;
        }

        write_summary(&mut out, self)
    }

    /// Serializable view of the receipt.
    pub fn view(&self) -> ReceiptView {
        ReceiptView::from(self)
    }

    /// Writes the receipt as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be encoded or written.
    pub fn write_json_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        serde_json::to_writer_pretty(&mut out, &self.view())?;

        writeln!(out).map_err(|_err| ReceiptError::IO)
    }
}

/// Serializable receipt, amounts rendered as decimal strings.
#[derive(Debug, Serialize)]
pub struct ReceiptView {
    /// ISO currency code
    pub currency: &'static str,

    /// Total before any discount
    pub original_subtotal: String,

    /// Subtotal after discounts
    pub subtotal: String,

    /// Sum of applied discounts
    pub total_discount: String,

    /// Tax on the discounted subtotal
    pub tax: String,

    /// Amount payable
    pub total: String,

    /// Winning discounts
    pub applied_discounts: Vec<AppliedDiscountView>,
}

/// Serializable applied discount.
#[derive(Debug, Serialize)]
pub struct AppliedDiscountView {
    /// Rule name
    pub rule_name: String,

    /// Human-readable description
    pub description: String,

    /// Amount discounted
    pub amount: String,

    /// Descriptions of the affected lines
    pub affected_items: Vec<String>,

    /// Identifiers of the affected lines
    pub affected_item_ids: Vec<String>,
}

impl From<&Receipt<'_>> for ReceiptView {
    fn from(receipt: &Receipt<'_>) -> Self {
        Self {
            currency: receipt.currency.iso_alpha_code,
            original_subtotal: receipt.original_subtotal.amount().to_string(),
            subtotal: receipt.subtotal.amount().to_string(),
            total_discount: receipt.total_discount.amount().to_string(),
            tax: receipt.tax.amount().to_string(),
            total: receipt.total.amount().to_string(),
            applied_discounts: receipt
                .applied_discounts
                .iter()
                .map(|applied| AppliedDiscountView {
                    rule_name: applied.rule_name.clone(),
                    description: applied.description.clone(),
                    amount: applied.amount.amount().to_string(),
                    affected_items: applied
                        .affected_items
                        .iter()
                        .map(|item| item.description.clone())
                        .collect(),
                    affected_item_ids: applied
                        .affected_items
                        .iter()
                        .map(|item| item.item_id.to_string())
                        .collect(),
                })
                .collect(),
        }
    }
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    color_ops: SmallVec<[(usize, usize, Color); 32]>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(3..6), Alignment::right());

    for (row, col, color) in color_ops {
        table.modify((row, col), color);
    }

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_summary(out: &mut impl io::Write, receipt: &Receipt<'_>) -> Result<(), ReceiptError> {
    let savings_percent_points = percent_points_from_fractional_percentage(receipt.savings_percent());

    let rows = [
        (" Before discounts:", format!("{}  ", receipt.original_subtotal())),
        (
            " Savings:",
            format!(
                "({savings_percent_points:.2}%) -{}  ",
                receipt.total_discount()
            ),
        ),
        (" Subtotal:", format!("{}  ", receipt.subtotal())),
        (" Tax:", format!("{}  ", receipt.tax())),
        (
            " \x1b[1mTotal:\x1b[0m",
            format!("\x1b[1m{}  \x1b[0m", receipt.total()),
        ),
    ];

    let label_width = rows
        .iter()
        .map(|(label, _)| visible_width(label))
        .max()
        .unwrap_or_default();

    let value_width = rows
        .iter()
        .map(|(_, value)| visible_width(value))
        .max()
        .unwrap_or_default();

    for (label, value) in &rows {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Converts a fractional percentage to percent points for display.
fn percent_points_from_fractional_percentage(percentage: Percentage) -> Decimal {
    // `Percentage` is a fraction (e.g. 0.25), so multiply by 100 to print percent points.
    ((percentage * Decimal::ONE) * Decimal::ONE_HUNDRED).round_dp(2)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_pad = label_col_width.saturating_sub(visible_width(label));
    let value_pad = value_col_width.saturating_sub(visible_width(value));

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

/// ANSI dark grey foreground.
fn color_dark_grey() -> Color {
    Color::new("\x1b[90m", "\x1b[0m")
}
