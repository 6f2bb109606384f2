//! Checkout
//!
//! Prices a basket fixture against a rule set and prints the receipt.

use std::io;

use anyhow::{Context, Result};
use tracing::info;

use checkout::{
    catalog::RuleCatalog,
    config::{Config, OutputFormat},
    engine::Engine,
    fixtures::{load_basket, load_rules},
    logging,
};

/// Checkout entry point
pub fn main() -> Result<()> {
    // `--help` and `--version` arrive as errors too; `exit` prints them to stdout
    // with status 0 and real parse errors to stderr with status 2.
    let config = Config::load().unwrap_or_else(|err| err.exit());

    logging::init(&config.logging)?;

    let basket = load_basket(&config.basket)
        .with_context(|| format!("loading basket {}", config.basket.display()))?;

    let catalog = match &config.rules {
        Some(path) => {
            load_rules(path).with_context(|| format!("loading rules {}", path.display()))?
        }
        None => RuleCatalog::with_defaults(),
    };

    let rules = catalog.active_rules(basket.currency())?;

    info!(
        items = basket.len(),
        rules = rules.len(),
        currency = basket.currency().iso_alpha_code,
        "pricing basket"
    );

    let receipt = Engine::with_rules(rules)
        .with_tax_rate(config.tax_rate())
        .calculate(&basket)?;

    info!(
        total = %receipt.total(),
        discount = %receipt.total_discount(),
        applied = receipt.applied_discounts().len(),
        "basket priced"
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match config.format {
        OutputFormat::Table => receipt.write_to(&mut handle, &basket)?,
        OutputFormat::Json => receipt.write_json_to(&mut handle)?,
    }

    Ok(())
}
