//! # Nexium Core
//!
//! Request dispatch and session logic - no infrastructure dependencies.
//!
//! This crate contains:
//! - Port/adapter interfaces (traits)
//! - Response classification
//! - Single-flight credential renewal and the retry queue
//! - The request dispatcher, account service and session refresher
//!
//! ## Architecture Principles
//! - Only depends on `nexium-domain`
//! - No HTTP or storage code
//! - All external dependencies via traits
//! - Lock-free across `.await`: every shared state mutation is synchronous

pub mod account;
pub mod dispatch;
pub mod ports;
pub mod session;

// Re-export specific items to avoid ambiguity
pub use account::AccountService;
pub use dispatch::{
    Classification, RenewalState, RequestDispatcher, RetryQueue, SingleFlightRenewer,
    TransportClient,
};
pub use ports::{
    CredentialStore, ExchangeRequest, ExchangeResponse, ResponseBody, SessionTerminator,
    Transport, TransportFailure,
};
pub use session::SessionRefresher;
