//! Logging setup for the resolver binary
//!
//! Logs go to stderr so stdout carries nothing but resolved addresses.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset
fn default_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "debug,hyper_util=info,reqwest::connect=info"
    } else {
        "info"
    }
}

/// Initialize the global tracing subscriber
pub fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter()));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    tracing::debug!("Logging initialized");
}
