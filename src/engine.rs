// src/engine.rs

use crate::error::ValuationError;
use crate::models::{Assumptions, Fundamentals, ValuationResult};

// Compounds trailing FCF forward, year 1 first
pub fn project_cash_flows(trailing: f64, growth_rate: f64, years: u32) -> Vec<f64> {
    let mut projected = Vec::with_capacity(years as usize);
    let mut fcf = trailing;
    for _ in 0..years {
        fcf *= 1.0 + growth_rate;
        projected.push(fcf);
    }
    projected
}

// CAPM
pub fn cost_of_equity(risk_free_rate: f64, beta: f64, market_return_rate: f64) -> f64 {
    risk_free_rate + beta * (market_return_rate - risk_free_rate)
}

pub fn after_tax_cost_of_debt(cost_of_debt_pretax: f64, tax_rate: f64) -> f64 {
    cost_of_debt_pretax * (1.0 - tax_rate)
}

/// Returns `(equity_weight, debt_weight)` of the capital structure.
pub fn capital_weights(market_cap: f64, total_debt: f64) -> Result<(f64, f64), ValuationError> {
    let value = market_cap + total_debt;
    if !(value > 0.0) {
        return Err(ValuationError::invalid_fundamentals(
            "market_cap + total_debt",
            "combined capital must be positive",
        ));
    }
    Ok((market_cap / value, total_debt / value))
}

pub fn weighted_average_cost_of_capital(
    equity_weight: f64,
    debt_weight: f64,
    cost_of_equity: f64,
    after_tax_cost_of_debt: f64,
) -> f64 {
    equity_weight * cost_of_equity + debt_weight * after_tax_cost_of_debt
}

/// Gordon growth terminal value on the final projected cash flow.
///
/// Refuses to divide when the discount rate does not exceed the growth
/// rate, since the perpetuity would be negative or divergent.
pub fn perpetuity_terminal_value(
    final_cash_flow: f64,
    wacc: f64,
    terminal_growth_rate: f64,
) -> Result<f64, ValuationError> {
    // 1 + wacc must stay positive for the discount factors
    if !(wacc > terminal_growth_rate) || !(wacc > -1.0) {
        return Err(ValuationError::InvalidDiscountRate {
            wacc,
            terminal_growth_rate,
        });
    }
    Ok(final_cash_flow * (1.0 + terminal_growth_rate) / (wacc - terminal_growth_rate))
}

/// Exit-multiple terminal value on EBITDA grown over the horizon.
///
/// Without EBITDA this returns `None` and the caller substitutes the
/// perpetuity value. A zero EBITDA counts as missing.
pub fn exit_multiple_terminal_value(
    ebitda_trailing: Option<f64>,
    growth_rate: f64,
    years: u32,
    exit_multiple: f64,
) -> Option<f64> {
    let ebitda = ebitda_trailing.filter(|ebitda| *ebitda != 0.0)?;
    let projected = ebitda * (1.0 + growth_rate).powi(years as i32);
    Some(projected * exit_multiple)
}

pub fn present_value(amount: f64, rate: f64, year: u32) -> f64 {
    amount / (1.0 + rate).powi(year as i32)
}

// Cash flow i (0-based) is discounted over i + 1 years
pub fn discount_cash_flows(cash_flows: &[f64], rate: f64) -> Vec<f64> {
    cash_flows
        .iter()
        .enumerate()
        .map(|(i, fcf)| present_value(*fcf, rate, i as u32 + 1))
        .collect()
}

fn ensure_finite(value: f64, quantity: &'static str) -> Result<f64, ValuationError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ValuationError::NonFiniteResult { quantity })
    }
}

/// Runs the full DCF: projection, WACC, terminal value, discounting and
/// the equity bridge.
///
/// Pure and deterministic. Both inputs are validated before any division.
pub fn valuate(
    assumptions: Assumptions,
    fundamentals: Fundamentals,
) -> Result<ValuationResult, ValuationError> {
    assumptions.check()?;
    fundamentals.check()?;

    let projected_cash_flows = project_cash_flows(
        fundamentals.free_cash_flow_trailing,
        assumptions.growth_rate,
        assumptions.projection_years,
    );
    let final_cash_flow = match projected_cash_flows.last() {
        Some(fcf) => *fcf,
        None => {
            return Err(ValuationError::invalid_fundamentals(
                "projected_cash_flows",
                "projection horizon is empty",
            ))
        }
    };

    // Discount rate
    let cost_of_equity = cost_of_equity(
        assumptions.risk_free_rate,
        assumptions.beta,
        assumptions.market_return_rate,
    );
    let after_tax_cost_of_debt =
        after_tax_cost_of_debt(assumptions.cost_of_debt_pretax, assumptions.tax_rate);
    let (equity_weight, debt_weight) =
        capital_weights(fundamentals.market_cap, fundamentals.total_debt)?;
    let wacc = weighted_average_cost_of_capital(
        equity_weight,
        debt_weight,
        cost_of_equity,
        after_tax_cost_of_debt,
    );
    tracing::debug!(cost_of_equity, after_tax_cost_of_debt, wacc, "Computed discount rate");

    // Terminal value
    let terminal_value_perp =
        perpetuity_terminal_value(final_cash_flow, wacc, assumptions.terminal_growth_rate)?;
    // NOTE: falling back to the perpetuity value when EBITDA is missing makes
    // the "average" a plain perpetuity valuation. Kept as-is until the
    // methodology is confirmed.
    let terminal_value_exit = exit_multiple_terminal_value(
        fundamentals.ebitda_trailing,
        assumptions.growth_rate,
        assumptions.projection_years,
        assumptions.exit_multiple,
    )
    .unwrap_or(terminal_value_perp);
    let terminal_value_average = (terminal_value_perp + terminal_value_exit) / 2.0;

    // Discounting
    let discounted_cash_flows = discount_cash_flows(&projected_cash_flows, wacc);
    let discounted_terminal_value =
        present_value(terminal_value_average, wacc, assumptions.projection_years);
    let enterprise_value = ensure_finite(
        discounted_cash_flows.iter().sum::<f64>() + discounted_terminal_value,
        "enterprise_value",
    )?;

    // Equity bridge
    let equity_value = enterprise_value - fundamentals.total_debt;
    let implied_share_price = ensure_finite(
        equity_value / fundamentals.shares_outstanding,
        "implied_share_price",
    )?;
    tracing::debug!(enterprise_value, equity_value, implied_share_price, "Valuation complete");

    Ok(ValuationResult {
        ticker: None,
        projected_cash_flows,
        discounted_cash_flows,
        cost_of_equity,
        after_tax_cost_of_debt,
        equity_weight,
        debt_weight,
        wacc,
        terminal_value_perp,
        terminal_value_exit,
        terminal_value_average,
        discounted_terminal_value,
        enterprise_value,
        equity_value,
        implied_share_price,
        current_market_price: fundamentals.current_market_price,
    })
}
