//! # Nexium Domain
//!
//! Domain types and models for the Nexium client.
//!
//! This crate contains:
//! - Request descriptors, credentials and account payloads
//! - Error types and Result definitions
//! - Configuration structures
//! - Endpoint and wire constants
//!
//! ## Architecture
//! - No dependencies on other Nexium crates
//! - Only external dependencies allowed
//! - Pure data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
