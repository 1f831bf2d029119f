//! Infrastructure error conversions

mod conversions;

pub use conversions::{transport_failure, InfraError};
