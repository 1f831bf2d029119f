//! Observability infrastructure
//!
//! Installs the process-wide `tracing` subscriber. Everything else in the
//! workspace only emits events through `tracing` macros.

pub mod logging;

pub use logging::{init_tracing, LOG_ENV_VAR};
