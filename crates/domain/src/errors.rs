//! Error types used throughout the client

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for configuration, assembly and infrastructure failures
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum NexiumError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client could not be built or reached the network badly
    #[error("Network error: {0}")]
    Network(String),

    /// Caller-supplied value out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Lifecycle failure inside the client
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for Nexium operations
pub type Result<T> = std::result::Result<T, NexiumError>;

/// Failure returned to the caller of a dispatched request.
///
/// Every request resolves with either a decoded body or exactly one of these.
/// An expired credential is never among them: it is absorbed by session
/// renewal and turns into either a replayed result or [`SessionExpired`].
///
/// [`SessionExpired`]: DispatchError::SessionExpired
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DispatchError {
    /// No usable response: network failure, server fault (5xx) or an error
    /// response whose body could not be decoded.
    #[error("Transport error: {message}")]
    Transport {
        /// What went wrong
        message: String,
    },

    /// The server rejected the request with a structured error body.
    #[error("API error ({code}): {message}")]
    Api {
        /// Machine-readable code, such as `accessdenied`
        code: String,
        /// Human-readable description
        message: String,
    },

    /// Session renewal failed or was refused; the credential has been cleared.
    #[error("Session expired")]
    SessionExpired,
}

impl DispatchError {
    /// Shorthand for [`DispatchError::Transport`]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    /// Shorthand for [`DispatchError::Api`]
    pub fn api(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api { code: code.into(), message: message.into() }
    }

    /// Server-provided error code, for [`DispatchError::Api`] only.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => Some(code),
            Self::Transport { .. } | Self::SessionExpired => None,
        }
    }

    /// Whether the session ended and the caller should sign in again
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Stable label suitable for log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::Api { .. } => "api",
            Self::SessionExpired => "session_expired",
        }
    }
}

/// Result of a dispatched request
pub type DispatchResult<T = serde_json::Value> = std::result::Result<T, DispatchError>;
