//! Account and session lifecycle on top of the dispatcher

pub mod service;

pub use service::AccountService;
