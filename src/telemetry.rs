//! Tracing subscriber setup.
//!
//! Logs go to stderr so command output on stdout stays machine-readable.
//! Metrics are emitted through the `metrics` facade; no recorder is installed
//! here, so counters are no-ops unless the host process installs one.

use anyhow::Result;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::Config;

/// Installs the global subscriber.
///
/// `RUST_LOG` directives win over the configured default level.
///
/// # Errors
///
/// Returns an error if the level is not a valid filter directive or a global
/// subscriber is already installed.
pub fn init(config: &Config) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.log_format == "json" {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .try_init()?;
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_ansi(true),
            )
            .try_init()?;
    }

    Ok(())
}
