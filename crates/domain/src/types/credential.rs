//! Session credential

use std::fmt;

use serde::{Deserialize, Serialize};

/// Access token plus the optional refresh token issued alongside it.
///
/// `Debug` output never contains token material.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

impl Credential {
    /// Credential without a refresh token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: None }
    }

    /// Credential renewed with a separate refresh token
    pub fn with_refresh(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: Some(refresh_token.into()) }
    }

    /// Token sent as `Authorization: Bearer` on every request
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Refresh token, when the login granted one
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Token presented to the renewal endpoint: the refresh token when one
    /// was issued, otherwise the (possibly expired) access token.
    pub fn renewal_token(&self) -> &str {
        self.refresh_token.as_deref().unwrap_or(&self.access_token)
    }

    /// Same credential with a renewed access token; the refresh token is kept.
    #[must_use]
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self { access_token: access_token.into(), refresh_token: self.refresh_token.clone() }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renewal_token_prefers_refresh_token() {
        assert_eq!(Credential::new("access").renewal_token(), "access");
        assert_eq!(Credential::with_refresh("access", "refresh").renewal_token(), "refresh");
    }

    #[test]
    fn test_with_access_token_keeps_refresh_token() {
        let renewed = Credential::with_refresh("old", "refresh").with_access_token("new");
        assert_eq!(renewed.access_token(), "new");
        assert_eq!(renewed.refresh_token(), Some("refresh"));
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", Credential::with_refresh("secret-a", "secret-r"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
