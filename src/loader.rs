// src/loader.rs

use serde::{Deserialize, Deserializer};

use crate::error::ValuationError;
use crate::models::{Fundamentals, FCF_MARKET_CAP_FALLBACK_RATIO};

// Custom function to read a provider number. Values arrive as
// {"raw": 1.0, "fmt": "1"}, {}, bare numbers, numeric strings or null.
fn raw_to_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawField {
        Wrapped { raw: Option<f64> },
        Number(f64),
        Text(String),
    }

    match Option::<RawField>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawField::Wrapped { raw }) => Ok(raw),
        Some(RawField::Number(value)) => Ok(Some(value)),
        Some(RawField::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<f64>().map(Some).map_err(serde::de::Error::custom)
            }
        }
    }
}

// Define quoteSummary API structure
#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResponse {
    pub quote_summary: QuoteSummary,
}

#[derive(Deserialize, Debug)]
pub struct QuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<QuoteSummaryError>,
}

#[derive(Deserialize, Debug)]
pub struct QuoteSummaryError {
    pub code: String,
    pub description: String,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResult {
    #[serde(default)]
    pub financial_data: Option<FinancialData>,
    #[serde(default)]
    pub default_key_statistics: Option<DefaultKeyStatistics>,
    #[serde(default)]
    pub price: Option<PriceModule>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct FinancialData {
    #[serde(default, deserialize_with = "raw_to_f64")]
    pub free_cashflow: Option<f64>,
    #[serde(default, deserialize_with = "raw_to_f64")]
    pub ebitda: Option<f64>,
    #[serde(default, deserialize_with = "raw_to_f64")]
    pub total_debt: Option<f64>,
    #[serde(default, deserialize_with = "raw_to_f64")]
    pub current_price: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct DefaultKeyStatistics {
    #[serde(default, deserialize_with = "raw_to_f64")]
    pub shares_outstanding: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct PriceModule {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default, deserialize_with = "raw_to_f64")]
    pub market_cap: Option<f64>,
    #[serde(default, deserialize_with = "raw_to_f64")]
    pub regular_market_price: Option<f64>,
}

/// How a single fundamental was obtained.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldOutcome {
    Present(f64),
    Defaulted(f64),
    Missing,
}

impl FieldOutcome {
    pub fn from_optional(value: Option<f64>) -> Self {
        match value {
            Some(v) => FieldOutcome::Present(v),
            None => FieldOutcome::Missing,
        }
    }

    pub fn or_default(self, default: f64) -> Self {
        match self {
            FieldOutcome::Missing => FieldOutcome::Defaulted(default),
            other => other,
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            FieldOutcome::Present(v) | FieldOutcome::Defaulted(v) => Some(v),
            FieldOutcome::Missing => None,
        }
    }

    pub fn required(self, ticker: &str, field: &'static str) -> Result<f64, ValuationError> {
        self.value().ok_or_else(|| ValuationError::DataUnavailable {
            ticker: ticker.to_string(),
            field,
        })
    }
}

/// Raw provider fields for one ticker, flattened from the response modules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFundamentals {
    pub free_cash_flow: Option<f64>,
    pub ebitda: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub total_debt: Option<f64>,
    pub market_cap: Option<f64>,
    pub regular_market_price: Option<f64>,
}

impl From<QuoteSummaryResult> for RawFundamentals {
    fn from(result: QuoteSummaryResult) -> Self {
        let financial = result.financial_data.unwrap_or_default();
        let statistics = result.default_key_statistics.unwrap_or_default();
        let price = result.price.unwrap_or_default();

        RawFundamentals {
            free_cash_flow: financial.free_cashflow,
            ebitda: financial.ebitda,
            shares_outstanding: statistics.shares_outstanding,
            total_debt: financial.total_debt,
            market_cap: price.market_cap,
            // Some listings only report the price under financialData
            regular_market_price: price.regular_market_price.or(financial.current_price),
        }
    }
}

impl QuoteSummaryResponse {
    // Unwraps the single result for the requested ticker
    pub fn into_raw(self, ticker: &str) -> Result<RawFundamentals, ValuationError> {
        if let Some(error) = self.quote_summary.error {
            return Err(ValuationError::ProviderResponse {
                ticker: ticker.to_string(),
                message: format!("{}: {}", error.code, error.description),
            });
        }

        let result = self
            .quote_summary
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| ValuationError::ProviderResponse {
                ticker: ticker.to_string(),
                message: "empty result".to_string(),
            })?;

        // A redirected or aliased symbol would value the wrong company
        let symbol = result.price.as_ref().and_then(|price| price.symbol.as_deref());
        if let Some(symbol) = symbol {
            if !symbol.eq_ignore_ascii_case(ticker) {
                return Err(ValuationError::ProviderResponse {
                    ticker: ticker.to_string(),
                    message: format!("response is for symbol {}", symbol),
                });
            }
        }

        Ok(RawFundamentals::from(result))
    }
}

/// Applies fallbacks and required-field rules to the raw provider record.
///
/// Required: market cap, shares outstanding, market price. Free cash flow
/// falls back to 5% of market cap, total debt to zero. EBITDA stays
/// optional.
pub fn resolve_fundamentals(
    ticker: &str,
    raw: &RawFundamentals,
) -> Result<Fundamentals, ValuationError> {
    let market_cap = FieldOutcome::from_optional(raw.market_cap).required(ticker, "marketCap")?;
    let shares_outstanding = FieldOutcome::from_optional(raw.shares_outstanding)
        .required(ticker, "sharesOutstanding")?;
    let current_market_price = FieldOutcome::from_optional(raw.regular_market_price)
        .required(ticker, "regularMarketPrice")?;

    let free_cash_flow = FieldOutcome::from_optional(raw.free_cash_flow)
        .or_default(market_cap * FCF_MARKET_CAP_FALLBACK_RATIO);
    let total_debt = FieldOutcome::from_optional(raw.total_debt).or_default(0.0);

    for (field, outcome) in [("freeCashflow", free_cash_flow), ("totalDebt", total_debt)] {
        if let FieldOutcome::Defaulted(value) = outcome {
            tracing::warn!(ticker, field, value, "Provider has no value, using default");
        }
    }
    if raw.ebitda.map_or(true, |ebitda| ebitda == 0.0) {
        tracing::warn!(ticker, "No EBITDA available, exit multiple will mirror perpetuity value");
    }

    Ok(Fundamentals {
        free_cash_flow_trailing: free_cash_flow.required(ticker, "freeCashflow")?,
        ebitda_trailing: raw.ebitda,
        shares_outstanding,
        total_debt: total_debt.required(ticker, "totalDebt")?,
        market_cap,
        current_market_price,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NKE_RESPONSE: &str = r#"
    {
        "quoteSummary": {
            "result": [
                {
                    "financialData": {
                        "currentPrice": {"raw": 61.2, "fmt": "61.20"},
                        "totalDebt": {"raw": 11000000000, "fmt": "11B", "longFmt": "11,000,000,000"},
                        "ebitda": {"raw": 4800000000, "fmt": "4.8B"},
                        "freeCashflow": {"raw": 3300000000, "fmt": "3.3B"}
                    },
                    "defaultKeyStatistics": {
                        "sharesOutstanding": {"raw": 1476000000, "fmt": "1.48B"}
                    },
                    "price": {
                        "symbol": "NKE",
                        "marketCap": {"raw": 90000000000, "fmt": "90B"},
                        "regularMarketPrice": {"raw": 61.25, "fmt": "61.25"}
                    }
                }
            ],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_quote_summary() {
        let response: QuoteSummaryResponse = serde_json::from_str(NKE_RESPONSE).unwrap();
        let raw = response.into_raw("NKE").unwrap();

        assert_eq!(raw.free_cash_flow, Some(3_300_000_000.0));
        assert_eq!(raw.ebitda, Some(4_800_000_000.0));
        assert_eq!(raw.shares_outstanding, Some(1_476_000_000.0));
        assert_eq!(raw.total_debt, Some(11_000_000_000.0));
        assert_eq!(raw.market_cap, Some(90_000_000_000.0));
        assert_eq!(raw.regular_market_price, Some(61.25));
    }

    #[test]
    fn test_parse_loose_number_formats() {
        let body = r#"
        {
            "quoteSummary": {
                "result": [
                    {
                        "financialData": {
                            "freeCashflow": {},
                            "ebitda": null,
                            "totalDebt": "2500000",
                            "currentPrice": 12.5
                        },
                        "price": {"marketCap": ""}
                    }
                ]
            }
        }"#;
        let response: QuoteSummaryResponse = serde_json::from_str(body).unwrap();
        let raw = response.into_raw("TEST").unwrap();

        assert_eq!(raw.free_cash_flow, None);
        assert_eq!(raw.ebitda, None);
        assert_eq!(raw.total_debt, Some(2_500_000.0));
        assert_eq!(raw.market_cap, None);
        assert_eq!(raw.shares_outstanding, None);
        assert_eq!(raw.regular_market_price, Some(12.5));
    }

    #[test]
    fn test_provider_error_payload() {
        let body = r#"
        {
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for ticker symbol: ZZZZ"}
            }
        }"#;
        let response: QuoteSummaryResponse = serde_json::from_str(body).unwrap();
        match response.into_raw("ZZZZ") {
            Err(ValuationError::ProviderResponse { ticker, message }) => {
                assert_eq!(ticker, "ZZZZ");
                assert!(message.starts_with("Not Found"));
            }
            other => panic!("Expected ProviderResponse error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_result_is_error() {
        let body = r#"{"quoteSummary": {"result": [], "error": null}}"#;
        let response: QuoteSummaryResponse = serde_json::from_str(body).unwrap();
        assert!(matches!(
            response.into_raw("NKE"),
            Err(ValuationError::ProviderResponse { .. })
        ));
    }

    #[test]
    fn test_symbol_mismatch_is_error() {
        let response: QuoteSummaryResponse = serde_json::from_str(NKE_RESPONSE).unwrap();
        match response.into_raw("AAPL") {
            Err(ValuationError::ProviderResponse { ticker, message }) => {
                assert_eq!(ticker, "AAPL");
                assert_eq!(message, "response is for symbol NKE");
            }
            other => panic!("Expected ProviderResponse error, got {:?}", other),
        }

        // Symbol comparison ignores case
        let response: QuoteSummaryResponse = serde_json::from_str(NKE_RESPONSE).unwrap();
        assert!(response.into_raw("nke").is_ok());
    }

    #[test]
    fn test_field_outcome() {
        assert_eq!(FieldOutcome::from_optional(Some(1.0)).or_default(2.0), FieldOutcome::Present(1.0));
        assert_eq!(FieldOutcome::from_optional(None).or_default(2.0), FieldOutcome::Defaulted(2.0));
        assert_eq!(FieldOutcome::Missing.value(), None);
        assert!(matches!(
            FieldOutcome::Missing.required("NKE", "marketCap"),
            Err(ValuationError::DataUnavailable { field: "marketCap", .. })
        ));
    }

    #[test]
    fn test_resolve_applies_fallbacks() {
        let raw = RawFundamentals {
            free_cash_flow: None,
            ebitda: None,
            shares_outstanding: Some(100.0),
            total_debt: None,
            market_cap: Some(1_000.0),
            regular_market_price: Some(9.5),
        };
        let fundamentals = resolve_fundamentals("TEST", &raw).unwrap();

        assert_eq!(fundamentals.free_cash_flow_trailing, 50.0);
        assert_eq!(fundamentals.total_debt, 0.0);
        assert_eq!(fundamentals.ebitda_trailing, None);
        assert_eq!(fundamentals.current_market_price, 9.5);
    }

    #[test]
    fn test_resolve_missing_required_fields() {
        let complete = RawFundamentals {
            free_cash_flow: Some(10.0),
            ebitda: Some(20.0),
            shares_outstanding: Some(100.0),
            total_debt: Some(5.0),
            market_cap: Some(1_000.0),
            regular_market_price: Some(9.5),
        };
        assert!(resolve_fundamentals("TEST", &complete).is_ok());

        let cases = [
            (
                RawFundamentals { market_cap: None, ..complete.clone() },
                "marketCap",
            ),
            (
                RawFundamentals { shares_outstanding: None, ..complete.clone() },
                "sharesOutstanding",
            ),
            (
                RawFundamentals { regular_market_price: None, ..complete.clone() },
                "regularMarketPrice",
            ),
        ];

        for (raw, expected) in cases {
            match resolve_fundamentals("TEST", &raw) {
                Err(ValuationError::DataUnavailable { ticker, field }) => {
                    assert_eq!(ticker, "TEST");
                    assert_eq!(field, expected);
                }
                other => panic!("Expected DataUnavailable for {}, got {:?}", expected, other),
            }
        }
    }
}
