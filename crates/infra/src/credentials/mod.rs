//! Credential storage

pub mod memory;

pub use memory::MemoryCredentialStore;
