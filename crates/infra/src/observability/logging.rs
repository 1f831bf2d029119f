//! Tracing subscriber setup

use nexium_domain::{LoggingConfig, NexiumError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Environment variable holding `EnvFilter` directives; overrides the
/// configured level when set.
pub const LOG_ENV_VAR: &str = "NEXIUM_LOG";

/// Build the filter: `NEXIUM_LOG` if set and valid, else the configured level.
///
/// # Errors
/// Returns `NexiumError::Config` if neither yields a valid filter.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| NexiumError::Config(format!("Invalid log filter {:?}: {}", config.level, e)))
}

/// Install a global `fmt` subscriber, plain or JSON.
///
/// Returns `Ok(false)` without touching anything if a global subscriber is
/// already installed, so embedding applications keep their own.
///
/// # Errors
/// Returns `NexiumError::Config` for an invalid filter.
pub fn init_tracing(config: &LoggingConfig) -> Result<bool> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let filter = env_filter(config)?;
    let installed = if config.json {
        fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init()
    } else {
        fmt().with_env_filter(filter).with_target(true).compact().try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(json = config.json, "tracing initialized");
            Ok(true)
        }
        // Lost a race with another initializer.
        Err(_) => Ok(false),
    }
}
