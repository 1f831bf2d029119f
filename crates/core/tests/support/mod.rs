//! Shared test helpers for `nexium-core` integration tests.
//!
//! A fake backend, an in-memory credential store and a counting terminator, so
//! dispatch tests can focus on behaviour instead of wiring.

#![allow(dead_code)]

pub mod backend;
pub mod session;

use std::sync::Arc;
use std::time::Duration;

use nexium_core::RequestDispatcher;
use nexium_domain::Credential;

pub use backend::{FakeBackend, RenewalBehavior, Seen};
pub use session::{CountingTerminator, MemoryStore};

pub const RENEWAL_PATH: &str = "/api/session/refresh";

/// Dispatcher wired to fresh fakes
pub struct Harness {
    pub dispatcher: RequestDispatcher,
    pub backend: Arc<FakeBackend>,
    pub store: Arc<MemoryStore>,
    pub terminator: Arc<CountingTerminator>,
}

impl Harness {
    /// Backend accepts `valid`; the store holds `held`.
    pub fn new(valid: &str, held: Option<Credential>) -> Self {
        Self::with_timeout(valid, held, Duration::from_secs(5))
    }

    pub fn with_timeout(valid: &str, held: Option<Credential>, renewal_timeout: Duration) -> Self {
        let backend = Arc::new(FakeBackend::new(valid));
        let store = Arc::new(MemoryStore::new(held));
        let terminator = Arc::new(CountingTerminator::default());
        let dispatcher = RequestDispatcher::new(
            store.clone(),
            backend.clone(),
            terminator.clone(),
            RENEWAL_PATH,
            renewal_timeout,
        );
        Self { dispatcher, backend, store, terminator }
    }

    /// Wait until `count` requests are parked behind the running renewal.
    pub async fn wait_for_queued(&self, count: usize) {
        wait_until(|| self.dispatcher.renewer().queued() >= count).await;
    }
}

/// Poll `condition` until it holds; panics after two seconds.
pub async fn wait_until(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}
