//! Standardized logging setup for strategy services.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for a strategy service.
///
/// `RUST_LOG` takes precedence when set; otherwise the service runs at
/// `info` with its own crate at `debug`. Safe to call once per process.
pub fn init_strategy_logging(service: &str) -> Result<()> {
    init_strategy_logging_with_level(service, "info")
}

/// Initialize tracing with an explicit default level (config/CLI override).
pub fn init_strategy_logging_with_level(service: &str, default_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(default_level)
            .add_directive(format!("{}=debug", service).parse()?),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}
