//! Tracing setup for the CLI runner.

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber with plain formatted output.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
