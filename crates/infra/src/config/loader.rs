//! Configuration loader
//!
//! Loads client configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the environment if one is present
//! 2. Attempts to load from environment variables
//! 3. If `NEXIUM_API_BASE_URL` is unset, falls back to loading from file
//! 4. Probes multiple paths for config files
//! 5. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `NEXIUM_API_BASE_URL`: API base URL (required for env loading)
//! - `NEXIUM_REQUEST_TIMEOUT`: Per-request timeout in seconds
//! - `NEXIUM_USER_AGENT`: User agent sent with every request
//! - `NEXIUM_RENEWAL_PATH`: Session renewal endpoint path
//! - `NEXIUM_RENEWAL_TIMEOUT`: Renewal timeout in seconds
//! - `NEXIUM_REFRESH_INTERVAL`: Proactive renewal interval in seconds
//! - `NEXIUM_LOG_LEVEL`: Default log filter
//! - `NEXIUM_LOG_JSON`: Emit JSON logs (true/false)
//!
//! ## File Locations
//! The loader searches the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./nexium.json` or `./nexium.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use nexium_domain::{ClientConfig, NexiumError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the base URL is
/// not set there, falls back to loading from a config file.
///
/// # Errors
/// Returns `NexiumError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - A value fails validation
pub fn load() -> Result<ClientConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `NEXIUM_API_BASE_URL` is required; every other variable falls back
/// to its default.
///
/// # Errors
/// Returns `NexiumError::Config` if the base URL is missing or a variable
/// has an invalid value.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut config = ClientConfig::default();

    config.api.base_url = env_var("NEXIUM_API_BASE_URL")?;
    if let Some(timeout) = env_parse::<u64>("NEXIUM_REQUEST_TIMEOUT", "request timeout")? {
        config.api.request_timeout_secs = timeout;
    }
    if let Ok(agent) = std::env::var("NEXIUM_USER_AGENT") {
        config.api.user_agent = Some(agent);
    }

    if let Ok(path) = std::env::var("NEXIUM_RENEWAL_PATH") {
        config.session.renewal_path = path;
    }
    if let Some(timeout) = env_parse::<u64>("NEXIUM_RENEWAL_TIMEOUT", "renewal timeout")? {
        config.session.renewal_timeout_secs = timeout;
    }
    config.session.refresh_interval_secs =
        env_parse::<u64>("NEXIUM_REFRESH_INTERVAL", "refresh interval")?;

    if let Ok(level) = std::env::var("NEXIUM_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("NEXIUM_LOG_JSON", config.logging.json);

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, searches multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`find_config_path`].
///
/// # Errors
/// Returns `NexiumError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - A value fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(NexiumError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => find_config_path().ok_or_else(|| {
            NexiumError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| NexiumError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`). Missing
/// sections and fields take their defaults.
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| NexiumError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| NexiumError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(NexiumError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn find_config_path() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(candidates_in(&cwd));
        candidates.extend([cwd.join("../config.json"), cwd.join("../config.toml")]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(candidates_in(exe_dir));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn candidates_in(dir: &Path) -> [PathBuf; 4] {
    [
        dir.join("config.json"),
        dir.join("config.toml"),
        dir.join("nexium.json"),
        dir.join("nexium.toml"),
    ]
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        NexiumError::Config(format!("Missing required environment variable: {}", key))
    })
}

/// Parse an optional environment variable; `Ok(None)` when unset.
fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| NexiumError::Config(format!("Invalid {what}: {e}"))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
