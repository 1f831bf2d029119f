//! Port interfaces for the dispatcher's external collaborators
//!
//! These traits define the boundaries between the dispatch protocol and the
//! infrastructure that stores credentials, moves bytes and ends sessions.

use async_trait::async_trait;
use nexium_domain::constants::{AUTHORIZATION_HEADER, BEARER_PREFIX};
use nexium_domain::{Credential, DispatchError, Method, RequestDescriptor};
use serde_json::Value;
use thiserror::Error;

/// Holder of the current session credential
///
/// Implementations must be cheap to call: the dispatcher reads the credential
/// on every request and mutations happen while the renewal state lock is held.
pub trait CredentialStore: Send + Sync {
    /// Current credential, or `None` when signed out
    fn read(&self) -> Option<Credential>;

    /// Swap in a renewed access token, keeping any refresh token
    fn replace(&self, access_token: String);

    /// Install a full credential (login, registration)
    fn set(&self, credential: Credential);

    /// Drop the credential
    fn clear(&self);
}

/// A single network exchange
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one request and return the status plus decoded body.
    ///
    /// # Errors
    /// Returns [`TransportFailure`] when no response was received at all.
    async fn exchange(&self, request: ExchangeRequest) -> Result<ExchangeResponse, TransportFailure>;
}

/// Application-level sign-out hook
#[async_trait]
pub trait SessionTerminator: Send + Sync {
    /// Clear application-visible login state
    async fn logout(&self);
}

/// Request handed to a [`Transport`]
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute, or relative to the transport's base URL
    pub url: String,
    /// Header name/value pairs in insertion order
    pub headers: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<Value>,
}

impl ExchangeRequest {
    /// Bare request with no headers or body
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self { method, url: url.into(), headers: Vec::new(), body: None }
    }

    /// Request carrying the descriptor's method, url and body
    pub fn from_descriptor(descriptor: &RequestDescriptor) -> Self {
        Self {
            method: descriptor.method(),
            url: descriptor.url().to_string(),
            headers: Vec::new(),
            body: descriptor.body().cloned(),
        }
    }

    #[must_use]
    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Attach `Authorization: Bearer <token>`; no header for `None` or empty.
    #[must_use]
    pub fn with_bearer(self, token: Option<&str>) -> Self {
        match token {
            Some(token) if !token.is_empty() => {
                self.with_header(AUTHORIZATION_HEADER, format!("{BEARER_PREFIX}{token}"))
            }
            _ => self,
        }
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Token from the `Authorization: Bearer` header, if present
    pub fn bearer_token(&self) -> Option<&str> {
        self.header(AUTHORIZATION_HEADER).and_then(|value| value.strip_prefix(BEARER_PREFIX))
    }
}

/// Response body as seen by the taxonomy
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// No body, or only whitespace
    Empty,
    /// Body that decoded as JSON
    Json(Value),
    /// Non-empty body that is not JSON; carries the raw text for diagnostics
    Undecodable(String),
}

impl ResponseBody {
    /// Decode raw response bytes. Whitespace-only bodies count as empty.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        match serde_json::from_slice(bytes) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Undecodable(String::from_utf8_lossy(bytes).into_owned()),
        }
    }

    /// The decoded JSON, if the body was JSON
    pub fn json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Empty | Self::Undecodable(_) => None,
        }
    }
}

/// Completed exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeResponse {
    /// HTTP status code
    pub status: u16,
    /// Body, decoded as far as possible
    pub body: ResponseBody,
}

impl ExchangeResponse {
    /// Response with `status` and `body`
    pub fn new(status: u16, body: ResponseBody) -> Self {
        Self { status, body }
    }

    /// Response with a JSON body
    pub fn json(status: u16, body: Value) -> Self {
        Self::new(status, ResponseBody::Json(body))
    }

    /// Response with no body
    pub fn empty(status: u16) -> Self {
        Self::new(status, ResponseBody::Empty)
    }

    /// Status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// No response was received (connection refused, DNS, timeout, redirect)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TransportFailure(pub String);

impl TransportFailure {
    /// Failure described by `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<TransportFailure> for DispatchError {
    fn from(failure: TransportFailure) -> Self {
        DispatchError::transport(failure.0)
    }
}
