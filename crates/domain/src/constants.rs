//! Application constants
//!
//! Centralized location for endpoint paths and wire values shared by the
//! dispatcher and the account service.

// Endpoint paths
/// Session renewal endpoint
pub const SESSION_REFRESH_PATH: &str = "/api/session/refresh";
/// Login endpoint
pub const SESSION_LOGIN_PATH: &str = "/api/session/login";
/// Registration endpoint
pub const ACCOUNT_NEW_PATH: &str = "/api/account/new";
/// Current-account endpoint
pub const ACCOUNT_WHOAMI_PATH: &str = "/api/account/whoami";
/// Logout endpoint
pub const ACCOUNT_LOGOUT_PATH: &str = "/api/account/logout";

// Error codes
/// Renewal refused for the presented credential
pub const ACCESS_DENIED_CODE: &str = "accessdenied";
/// Code used for an unauthenticated 401 without a structured body
pub const NOT_AUTHENTICATED_CODE: &str = "notauthenticated";

// Headers
/// Header carrying the bearer token
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Request body media type header
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
/// Media type of every request body
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Prefix of the `Authorization` value
pub const BEARER_PREFIX: &str = "Bearer ";
