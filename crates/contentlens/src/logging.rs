//! Process-wide tracing subscriber setup.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::LoggingError;

/// Installs the global subscriber and routes `log` records into it.
///
/// `RUST_LOG` wins over the configured level when it is set and parses.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let filter = build_filter(&config.level)?;
    let registry = tracing_subscriber::registry().with(filter);

    if config.json {
        tracing::subscriber::set_global_default(
            registry.with(fmt::layer().json().with_target(true)),
        )?;
    } else {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(true)))?;
    }

    tracing_log::LogTracer::init()?;

    tracing::debug!(level = %config.level, json = config.json, "Tracing initialized");
    Ok(())
}

fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        directive: level.to_string(),
        message: e.to_string(),
    })
}
