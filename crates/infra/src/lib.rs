//! # Nexium Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest-based HTTP transport
//! - Credential storage
//! - Session termination events
//! - Configuration loading and tracing setup
//! - [`NexiumClient`], which wires all of the above together
//!
//! ## Architecture
//! - Implements traits defined in `nexium-core`
//! - Depends on `nexium-domain` and `nexium-core`
//! - Contains all "impure" code (network, environment, files)

pub mod client;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod http;
pub mod observability;
pub mod session;

// Re-export commonly used items
pub use client::{NexiumClient, NexiumClientBuilder};
pub use credentials::MemoryCredentialStore;
pub use http::{HttpTransport, HttpTransportBuilder};
pub use observability::init_tracing;
pub use session::{BroadcastSessionTerminator, SessionEvent};
