// src/error.rs

use thiserror::Error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum ValuationError {
    // A required fundamental had no value and no fallback applies
    #[error("required field '{field}' is unavailable for {ticker}")]
    DataUnavailable { ticker: String, field: &'static str },

    #[error(
        "discount rate {wacc:.6} does not exceed terminal growth rate {terminal_growth_rate:.6}"
    )]
    InvalidDiscountRate { wacc: f64, terminal_growth_rate: f64 },

    // Inputs that would otherwise divide by zero or produce NaN
    #[error("invalid fundamentals: {field} {reason}")]
    InvalidFundamentals { field: &'static str, reason: String },

    #[error("invalid assumptions: {0}")]
    InvalidAssumptions(#[from] ValidationErrors),

    #[error("computed {quantity} is not a finite number")]
    NonFiniteResult { quantity: &'static str },

    #[error("request to fundamentals provider failed: {0}")]
    Provider(#[from] reqwest::Error),

    #[error("fundamentals provider returned no usable data for {ticker}: {message}")]
    ProviderResponse { ticker: String, message: String },
}

impl ValuationError {
    pub fn invalid_fundamentals(field: &'static str, reason: impl Into<String>) -> Self {
        ValuationError::InvalidFundamentals {
            field,
            reason: reason.into(),
        }
    }
}
