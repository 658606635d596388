// src/logging.rs

use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

// HTTP internals that drown out the valuation logs below warn
pub const NOISY_MODULES: &[&str] = &["hyper", "reqwest", "h2", "rustls", "tokio_util"];

pub fn build_filter_directives(log_level: &str) -> String {
    let mut directives = String::from(log_level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }
    directives
}

/// Initializes stderr logging. `RUST_LOG` takes precedence over `log_level`.
pub fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(build_filter_directives(log_level)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be set when embedded in tests
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
