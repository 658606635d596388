// src/main.rs

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use dcf_valuation::config::Cli;
use dcf_valuation::logging::init_logging;
use dcf_valuation::report::{render_json, render_text};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level());

    let result = dcf_valuation::run(&cli)
        .await
        .with_context(|| format!("Could not value {}", cli.ticker))?;

    if cli.json {
        println!("{}", render_json(&result)?);
    } else {
        print!("{}", render_text(&result, Local::now().date_naive()));
    }

    Ok(())
}
