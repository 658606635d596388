// src/lib.rs

pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod logging;
pub mod models;
pub mod provider;
pub mod report;

use config::Cli;
use error::ValuationError;
use models::ValuationResult;
use provider::FundamentalsClient;

// Fetch fundamentals for the CLI ticker and value them
pub async fn run(cli: &Cli) -> Result<ValuationResult, ValuationError> {
    let assumptions = cli.assumptions();
    // Fail on bad assumptions before touching the network
    assumptions.check()?;

    let client = FundamentalsClient::new(cli.provider_url.as_str(), cli.timeout())?;
    let fundamentals = client.fetch(&cli.ticker).await?;
    tracing::info!(ticker = %cli.ticker, "Using fetched values");

    let result = engine::valuate(assumptions, fundamentals)?;
    Ok(result.with_ticker(cli.ticker.as_str()))
}
