//! Account and session payloads

use serde::{Deserialize, Serialize};

/// A user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Server-assigned account id
    pub id: String,
    /// Display name
    pub full_name: String,
    /// Login name
    pub username: String,
}

/// Authentication method presented on login and registration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthMethod {
    /// Username and password
    Password { password: String },
}

impl AuthMethod {
    /// Password authentication
    pub fn password(password: impl Into<String>) -> Self {
        Self::Password { password: password.into() }
    }
}

impl std::fmt::Debug for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password { .. } => f.write_str("Password { .. }"),
        }
    }
}

/// Successful login or registration response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    /// Account the session belongs to
    pub account: Account,
    /// Short-lived bearer token
    pub access_token: String,
    /// Token presented to the renewal endpoint
    pub refresh_token: String,
}

/// Successful renewal response.
///
/// The backend names the field `token`; `accessToken` is accepted as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenewalGrant {
    /// Replacement access token
    #[serde(alias = "token")]
    pub access_token: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_auth_method_wire_format() {
        let value = serde_json::to_value(AuthMethod::password("hunter2")).unwrap();
        assert_eq!(value, json!({ "type": "password", "password": "hunter2" }));
        assert_eq!(format!("{:?}", AuthMethod::password("hunter2")), "Password { .. }");
    }

    #[test]
    fn test_renewal_grant_accepts_both_field_names() {
        let grant: RenewalGrant = serde_json::from_value(json!({ "token": "T2" })).unwrap();
        assert_eq!(grant.access_token, "T2");

        let grant: RenewalGrant = serde_json::from_value(json!({ "accessToken": "T3" })).unwrap();
        assert_eq!(grant.access_token, "T3");
    }

    #[test]
    fn test_session_grant_decodes_camel_case() {
        let grant: SessionGrant = serde_json::from_value(json!({
            "account": { "id": "1", "fullName": "Ada Lovelace", "username": "ada" },
            "accessToken": "A",
            "refreshToken": "R"
        }))
        .unwrap();
        assert_eq!(grant.account.full_name, "Ada Lovelace");
        assert_eq!(grant.refresh_token, "R");
    }
}
