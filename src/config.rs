//! Command-line configuration

use std::path::PathBuf;

use clap::{Args, Parser};
use rust_decimal::Decimal;

use crate::pricing::TaxRate;

/// Log output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Receipt output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Rendered receipt table.
    Table,

    /// JSON document.
    Json,
}

/// Logging settings.
#[derive(Debug, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,
}

/// Checkout configuration
#[derive(Debug, Parser)]
#[command(name = "checkout", version, about = "Price a basket against the discount rules", long_about = None)]
pub struct Config {
    /// Rule set YAML file; the built-in default rules are used when omitted
    #[arg(short, long, env = "CHECKOUT_RULES")]
    pub rules: Option<PathBuf>,

    /// Basket YAML file
    #[arg(short, long, env = "CHECKOUT_BASKET")]
    pub basket: PathBuf,

    /// Tax rate as a fraction of the discounted subtotal
    #[arg(long, env = "CHECKOUT_TAX_RATE", default_value = "0.07", value_parser = parse_tax_rate)]
    pub tax_rate: Decimal,

    /// Output format (table, json)
    #[arg(short, long, env = "CHECKOUT_FORMAT", value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Logging settings
    #[command(flatten)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from environment and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed
    pub fn load() -> Result<Self, clap::Error> {
        Self::try_parse()
    }

    /// Configured tax rate
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_fraction(self.tax_rate)
    }
}

fn parse_tax_rate(value: &str) -> Result<Decimal, String> {
    let rate = value
        .trim()
        .parse::<Decimal>()
        .map_err(|err| format!("invalid tax rate {value:?}: {err}"))?;

    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(format!("tax rate {rate} must be between 0 and 1"));
    }

    Ok(rate)
}
