// src/models.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::ValuationError;

// Default assumptions for the subject company
pub const DEFAULT_TERMINAL_GROWTH_RATE: f64 = 0.015;
pub const DEFAULT_EXIT_MULTIPLE: f64 = 16.08; // EV/EBITDA
pub const DEFAULT_GROWTH_RATE: f64 = 0.02;
pub const DEFAULT_PROJECTION_YEARS: u32 = 5;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.04543; // 10-year Treasury
pub const DEFAULT_MARKET_RETURN_RATE: f64 = 0.09043;
pub const DEFAULT_TAX_RATE: f64 = 0.165;
pub const DEFAULT_COST_OF_DEBT_PRETAX: f64 = 0.05;
pub const DEFAULT_BETA: f64 = 1.01;

// Share of market cap used as trailing FCF when the provider has none
pub const FCF_MARKET_CAP_FALLBACK_RATIO: f64 = 0.05;

/// Macro and company assumptions for one valuation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct Assumptions {
    pub terminal_growth_rate: f64,
    #[validate(range(min = 0.0))]
    pub exit_multiple: f64,
    pub growth_rate: f64,
    #[validate(range(min = 1, max = 100))]
    pub projection_years: u32,
    pub risk_free_rate: f64,
    pub market_return_rate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub tax_rate: f64,
    pub cost_of_debt_pretax: f64,
    pub beta: f64,
}

impl Default for Assumptions {
    fn default() -> Self {
        Assumptions {
            terminal_growth_rate: DEFAULT_TERMINAL_GROWTH_RATE,
            exit_multiple: DEFAULT_EXIT_MULTIPLE,
            growth_rate: DEFAULT_GROWTH_RATE,
            projection_years: DEFAULT_PROJECTION_YEARS,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            market_return_rate: DEFAULT_MARKET_RETURN_RATE,
            tax_rate: DEFAULT_TAX_RATE,
            cost_of_debt_pretax: DEFAULT_COST_OF_DEBT_PRETAX,
            beta: DEFAULT_BETA,
        }
    }
}

impl Assumptions {
    // Rejects NaN/inf before the range rules run, since range checks
    // compare false against NaN
    pub fn check(&self) -> Result<(), ValuationError> {
        let rates = [
            ("terminal_growth_rate", self.terminal_growth_rate),
            ("exit_multiple", self.exit_multiple),
            ("growth_rate", self.growth_rate),
            ("risk_free_rate", self.risk_free_rate),
            ("market_return_rate", self.market_return_rate),
            ("tax_rate", self.tax_rate),
            ("cost_of_debt_pretax", self.cost_of_debt_pretax),
            ("beta", self.beta),
        ];

        for (name, value) in rates {
            if !value.is_finite() {
                let mut errors = validator::ValidationErrors::new();
                errors.add(name, validator::ValidationError::new("finite"));
                return Err(ValuationError::InvalidAssumptions(errors));
            }
        }

        self.validate()?;
        Ok(())
    }
}

/// Trailing fundamentals for the subject company, after fallbacks are applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    pub free_cash_flow_trailing: f64,
    pub ebitda_trailing: Option<f64>,
    pub shares_outstanding: f64,
    pub total_debt: f64,
    pub market_cap: f64,
    pub current_market_price: f64,
}

impl Fundamentals {
    // Guards every denominator the engine uses
    pub fn check(&self) -> Result<(), ValuationError> {
        let values = [
            ("free_cash_flow_trailing", self.free_cash_flow_trailing),
            ("shares_outstanding", self.shares_outstanding),
            ("total_debt", self.total_debt),
            ("market_cap", self.market_cap),
            ("current_market_price", self.current_market_price),
        ];
        for (field, value) in values {
            if !value.is_finite() {
                return Err(ValuationError::invalid_fundamentals(field, "must be finite"));
            }
        }
        if let Some(ebitda) = self.ebitda_trailing {
            if !ebitda.is_finite() {
                return Err(ValuationError::invalid_fundamentals(
                    "ebitda_trailing",
                    "must be finite",
                ));
            }
        }

        if self.shares_outstanding <= 0.0 {
            return Err(ValuationError::invalid_fundamentals(
                "shares_outstanding",
                format!("must be positive, got {}", self.shares_outstanding),
            ));
        }
        if self.market_cap <= 0.0 {
            return Err(ValuationError::invalid_fundamentals(
                "market_cap",
                format!("must be positive, got {}", self.market_cap),
            ));
        }
        if self.market_cap + self.total_debt <= 0.0 {
            return Err(ValuationError::invalid_fundamentals(
                "market_cap + total_debt",
                "combined capital must be positive",
            ));
        }

        Ok(())
    }
}

/// Output of a single valuation. Values are unrounded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationResult {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub ticker: Option<String>,
    pub projected_cash_flows: Vec<f64>, // Year 1 first
    pub discounted_cash_flows: Vec<f64>,
    pub cost_of_equity: f64,
    pub after_tax_cost_of_debt: f64,
    pub equity_weight: f64,
    pub debt_weight: f64,
    pub wacc: f64,
    pub terminal_value_perp: f64,
    pub terminal_value_exit: f64,
    pub terminal_value_average: f64,
    pub discounted_terminal_value: f64,
    pub enterprise_value: f64,
    pub equity_value: f64,
    pub implied_share_price: f64,
    pub current_market_price: f64,
}

impl ValuationResult {
    pub fn with_ticker(mut self, ticker: impl Into<String>) -> Self {
        self.ticker = Some(ticker.into());
        self
    }

    // Fractional gap between intrinsic and market price
    pub fn upside(&self) -> Option<f64> {
        if self.current_market_price > 0.0 {
            Some(self.implied_share_price / self.current_market_price - 1.0)
        } else {
            None
        }
    }
}
