//! # Observability
//!
//! Structured logging through `tracing`. The binary installs one global
//! subscriber at startup; library code only emits events and spans.

pub mod logging;

pub use logging::log_config_info;

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

use crate::config::ObservabilityConfig;
use crate::errors::{Error, Result};

static SUBSCRIBER_INSTALLED: OnceLock<()> = OnceLock::new();

/// Install the global log subscriber.
///
/// `RUST_LOG` takes precedence over `config.log_level`. A second call fails
/// with [`Error::Config`] instead of replacing the first subscriber.
pub fn init_observability(config: &ObservabilityConfig) -> Result<()> {
    if SUBSCRIBER_INSTALLED.get().is_some() {
        return Err(Error::config("Log subscriber is already installed"));
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| Error::config(format!("Invalid log level '{}': {}", config.log_level, e)))?;

    // Stdout is reserved for command output such as issued bundles.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);
    let installed = if config.json_logging {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| Error::config(format!("Failed to install log subscriber: {}", e)))?;
    let _ = SUBSCRIBER_INSTALLED.set(());

    tracing::info!(
        service_name = %config.service_name,
        log_level = %config.log_level,
        json_logging = config.json_logging,
        "Logging initialized"
    );
    Ok(())
}
