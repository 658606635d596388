// src/provider.rs

use std::time::Duration;

use reqwest::Client;

use crate::error::ValuationError;
use crate::loader::{resolve_fundamentals, QuoteSummaryResponse, RawFundamentals};
use crate::models::Fundamentals;

pub const DEFAULT_PROVIDER_URL: &str = "https://query2.finance.yahoo.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const QUOTE_SUMMARY_MODULES: &str = "financialData,defaultKeyStatistics,price";

// The provider rejects requests without a browser-like agent
const USER_AGENT: &str = "Mozilla/5.0 (compatible; dcf_valuation)";

/// HTTP client for the quoteSummary fundamentals endpoint.
pub struct FundamentalsClient {
    client: Client,
    base_url: String,
}

impl FundamentalsClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ValuationError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(FundamentalsClient {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn quote_summary_url(&self, ticker: &str) -> String {
        format!("{}/v10/finance/quoteSummary/{}", self.base_url, ticker)
    }

    pub async fn fetch_raw(&self, ticker: &str) -> Result<RawFundamentals, ValuationError> {
        let url = self.quote_summary_url(ticker);
        tracing::info!(ticker, url = %url, "Fetching fundamentals");

        let response = self
            .client
            .get(&url)
            .query(&[("modules", QUOTE_SUMMARY_MODULES)])
            .send()
            .await?;

        // The error payload is still JSON on 404, so read it before the status
        let status = response.status();
        let body: Result<QuoteSummaryResponse, reqwest::Error> = response.json().await;
        match body {
            Ok(summary) => summary.into_raw(ticker),
            Err(e) if status.is_success() => Err(ValuationError::Provider(e)),
            Err(_) => Err(ValuationError::ProviderResponse {
                ticker: ticker.to_string(),
                message: format!("HTTP {}", status),
            }),
        }
    }

    /// Fetches and resolves fundamentals, aborting on missing required fields.
    pub async fn fetch(&self, ticker: &str) -> Result<Fundamentals, ValuationError> {
        let raw = self.fetch_raw(ticker).await?;
        tracing::debug!(ticker, ?raw, "Received fundamentals");
        resolve_fundamentals(ticker, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_summary_url() {
        let client =
            FundamentalsClient::new("http://localhost:1234/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.quote_summary_url("NKE"),
            "http://localhost:1234/v10/finance/quoteSummary/NKE"
        );
    }

    #[tokio::test]
    async fn test_connection_failure_is_provider_error() {
        // Port 9 (discard) has no listener on a test host
        let client =
            FundamentalsClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

        match client.fetch("NKE").await {
            Err(ValuationError::Provider(e)) => assert!(e.is_connect() || e.is_timeout()),
            other => panic!("Expected Provider error, got {:?}", other),
        }
    }
}
