// src/config.rs

use std::time::Duration;

use clap::Parser;

use crate::models::{
    Assumptions, DEFAULT_BETA, DEFAULT_COST_OF_DEBT_PRETAX, DEFAULT_EXIT_MULTIPLE,
    DEFAULT_GROWTH_RATE, DEFAULT_MARKET_RETURN_RATE, DEFAULT_PROJECTION_YEARS,
    DEFAULT_RISK_FREE_RATE, DEFAULT_TAX_RATE, DEFAULT_TERMINAL_GROWTH_RATE,
};
use crate::provider::{DEFAULT_PROVIDER_URL, DEFAULT_TIMEOUT_SECS};

/// Discounted cash flow valuation for a single listed company
#[derive(Parser, Debug, Clone)]
#[command(name = "dcf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Ticker symbol of the subject company
    #[arg(default_value = "NKE", value_parser = parse_ticker)]
    pub ticker: String,

    /// Perpetual growth rate after the projection horizon
    #[arg(long, default_value_t = DEFAULT_TERMINAL_GROWTH_RATE, allow_negative_numbers = true)]
    pub terminal_growth_rate: f64,

    /// EV/EBITDA multiple applied to terminal-year EBITDA
    #[arg(long, default_value_t = DEFAULT_EXIT_MULTIPLE)]
    pub exit_multiple: f64,

    /// Annual free cash flow growth rate
    #[arg(long, default_value_t = DEFAULT_GROWTH_RATE, allow_negative_numbers = true)]
    pub growth_rate: f64,

    /// Number of projected years
    #[arg(long, default_value_t = DEFAULT_PROJECTION_YEARS)]
    pub projection_years: u32,

    /// Risk-free rate (10-year Treasury)
    #[arg(long, default_value_t = DEFAULT_RISK_FREE_RATE, allow_negative_numbers = true)]
    pub risk_free_rate: f64,

    /// Expected market return
    #[arg(long, default_value_t = DEFAULT_MARKET_RETURN_RATE, allow_negative_numbers = true)]
    pub market_return_rate: f64,

    /// Effective tax rate
    #[arg(long, default_value_t = DEFAULT_TAX_RATE)]
    pub tax_rate: f64,

    /// Pre-tax cost of debt
    #[arg(long, default_value_t = DEFAULT_COST_OF_DEBT_PRETAX, allow_negative_numbers = true)]
    pub cost_of_debt_pretax: f64,

    /// Equity beta
    #[arg(long, default_value_t = DEFAULT_BETA, allow_negative_numbers = true)]
    pub beta: f64,

    /// Base URL of the fundamentals provider
    #[arg(long, default_value = DEFAULT_PROVIDER_URL)]
    pub provider_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Print the result as JSON instead of the text report
    #[arg(long)]
    pub json: bool,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

fn parse_ticker(s: &str) -> Result<String, String> {
    let ticker = s.trim();
    if ticker.is_empty() {
        return Err("ticker must not be empty".to_string());
    }
    if !ticker
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
    {
        return Err(format!("invalid ticker symbol: {}", ticker));
    }
    Ok(ticker.to_ascii_uppercase())
}

impl Cli {
    pub fn assumptions(&self) -> Assumptions {
        Assumptions {
            terminal_growth_rate: self.terminal_growth_rate,
            exit_multiple: self.exit_multiple,
            growth_rate: self.growth_rate,
            projection_years: self.projection_years,
            risk_free_rate: self.risk_free_rate,
            market_return_rate: self.market_return_rate,
            tax_rate: self.tax_rate,
            cost_of_debt_pretax: self.cost_of_debt_pretax,
            beta: self.beta,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
