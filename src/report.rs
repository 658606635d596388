// src/report.rs

use std::fmt;

use chrono::NaiveDate;

use crate::models::ValuationResult;

// Whole currency units with thousands separators, e.g. 21068953084.2 -> "21,068,953,084"
pub fn format_thousands(value: f64) -> String {
    let rounded = value.round();
    if !rounded.is_finite() {
        return rounded.to_string();
    }

    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

pub fn format_millions(values: &[f64]) -> String {
    let formatted: Vec<String> = values
        .iter()
        .map(|value| format!("{:.2}", value / 1e6))
        .collect();
    format!("[{}]", formatted.join(", "))
}

/// Text report for one valuation. `as_of` is injected so output is reproducible.
pub struct TextReport<'a> {
    pub result: &'a ValuationResult,
    pub as_of: NaiveDate,
}

impl fmt::Display for TextReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let result = self.result;

        writeln!(f, "--- WACC CALCULATION ---")?;
        writeln!(f, "Cost of Equity (CAPM): {:.4}", result.cost_of_equity)?;
        writeln!(f, "Cost of Debt (after-tax): {:.4}", result.after_tax_cost_of_debt)?;
        writeln!(
            f,
            "Capital Weights: equity {:.4} / debt {:.4}",
            result.equity_weight, result.debt_weight
        )?;
        writeln!(f, "WACC: {:.4}", result.wacc)?;
        writeln!(f)?;
        writeln!(f, "--- DCF VALUATION RESULTS ---")?;
        if let Some(ticker) = &result.ticker {
            writeln!(f, "Ticker: {}", ticker)?;
        }
        writeln!(f, "As of: {}", self.as_of.format("%Y-%m-%d"))?;
        writeln!(
            f,
            "Projected FCFs: {} (in millions)",
            format_millions(&result.projected_cash_flows)
        )?;
        writeln!(
            f,
            "Terminal Value (perpetuity): ${}",
            format_thousands(result.terminal_value_perp)
        )?;
        writeln!(
            f,
            "Terminal Value (exit multiple): ${}",
            format_thousands(result.terminal_value_exit)
        )?;
        writeln!(
            f,
            "Terminal Value (avg): ${}",
            format_thousands(result.terminal_value_average)
        )?;
        writeln!(
            f,
            "Discounted TV: ${}",
            format_thousands(result.discounted_terminal_value)
        )?;
        writeln!(
            f,
            "Enterprise Value: ${}",
            format_thousands(result.enterprise_value)
        )?;
        writeln!(f, "Equity Value: ${}", format_thousands(result.equity_value))?;
        writeln!(f, "Current Share Price: ${:.2}", result.current_market_price)?;
        writeln!(f, "Intrinsic Share Price: ${:.2}", result.implied_share_price)?;
        if let Some(upside) = result.upside() {
            writeln!(f, "Upside vs Market: {:+.2}%", upside * 100.0)?;
        }
        Ok(())
    }
}

pub fn render_text(result: &ValuationResult, as_of: NaiveDate) -> String {
    TextReport { result, as_of }.to_string()
}

pub fn render_json(result: &ValuationResult) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(result)
}
