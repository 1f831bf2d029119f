//! Domain types
//!
//! - [`request`]: the method/URL/body descriptor of a dispatched request
//! - [`credential`]: the access/refresh token pair held by the client
//! - [`account`]: account and session payloads exchanged with the backend

pub mod account;
pub mod credential;
pub mod request;

pub use account::{Account, AuthMethod, RenewalGrant, SessionGrant};
pub use credential::Credential;
pub use request::{Method, RequestDescriptor};
