//! Session lifecycle adapters

pub mod terminator;

pub use terminator::{BroadcastSessionTerminator, SessionEvent};
