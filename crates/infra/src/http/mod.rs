//! HTTP transport built on reqwest

pub mod transport;

pub use transport::{HttpTransport, HttpTransportBuilder};
