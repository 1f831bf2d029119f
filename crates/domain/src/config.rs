//! Configuration management

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::SESSION_REFRESH_PATH;
use crate::errors::{NexiumError, Result};

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Backend location and per-request settings
    pub api: ApiConfig,
    /// Renewal endpoint, timeout and background refresh
    pub session: SessionConfig,
    /// Tracing subscriber settings
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL that relative request paths are resolved against
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// `User-Agent` header; the HTTP client default when unset
    pub user_agent: Option<String>,
}

/// Session renewal configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path of the renewal endpoint, relative to `api.base_url`
    pub renewal_path: String,
    /// Upper bound on a single renewal cycle; expiry counts as renewal failure
    pub renewal_timeout_secs: u64,
    /// Proactive renewal interval. `None` disables background refresh.
    pub refresh_interval_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `NEXIUM_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of the compact format
    pub json: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            request_timeout_secs: 30,
            user_agent: None,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            renewal_path: SESSION_REFRESH_PATH.to_string(),
            renewal_timeout_secs: 15,
            refresh_interval_secs: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_string(), json: false }
    }
}

impl ApiConfig {
    /// `request_timeout_secs` as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl SessionConfig {
    /// `renewal_timeout_secs` as a `Duration`
    pub fn renewal_timeout(&self) -> Duration {
        Duration::from_secs(self.renewal_timeout_secs)
    }

    /// `refresh_interval_secs` as a `Duration`, if set
    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs.map(Duration::from_secs)
    }
}

impl ClientConfig {
    /// Check invariants that serde cannot express.
    ///
    /// # Errors
    /// Returns `NexiumError::Config` for an empty base URL, zero timeouts,
    /// a zero refresh interval or a renewal path that is not absolute.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(NexiumError::Config("api.base_url must not be empty".into()));
        }
        if self.api.request_timeout_secs == 0 {
            return Err(NexiumError::Config("api.request_timeout_secs must be positive".into()));
        }
        if self.session.renewal_timeout_secs == 0 {
            return Err(NexiumError::Config(
                "session.renewal_timeout_secs must be positive".into(),
            ));
        }
        if self.session.refresh_interval_secs == Some(0) {
            return Err(NexiumError::Config(
                "session.refresh_interval_secs must be positive when set".into(),
            ));
        }
        if !self.session.renewal_path.starts_with('/') {
            return Err(NexiumError::Config(format!(
                "session.renewal_path must start with '/': {}",
                self.session.renewal_path
            )));
        }
        Ok(())
    }
}
