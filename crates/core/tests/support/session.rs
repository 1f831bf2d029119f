use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use nexium_core::{CredentialStore, SessionTerminator};
use nexium_domain::Credential;
use parking_lot::Mutex;

/// Credential store backed by a mutex
pub struct MemoryStore {
    credential: Mutex<Option<Credential>>,
}

impl MemoryStore {
    pub fn new(credential: Option<Credential>) -> Self {
        Self { credential: Mutex::new(credential) }
    }

    pub fn access_token(&self) -> Option<String> {
        self.credential.lock().as_ref().map(|c| c.access_token().to_string())
    }
}

impl CredentialStore for MemoryStore {
    fn read(&self) -> Option<Credential> {
        self.credential.lock().clone()
    }

    fn replace(&self, access_token: String) {
        let mut credential = self.credential.lock();
        *credential = Some(match credential.as_ref() {
            Some(current) => current.with_access_token(access_token),
            None => Credential::new(access_token),
        });
    }

    fn set(&self, credential: Credential) {
        *self.credential.lock() = Some(credential);
    }

    fn clear(&self) {
        *self.credential.lock() = None;
    }
}

/// Terminator that only counts logouts
#[derive(Default)]
pub struct CountingTerminator {
    logouts: AtomicUsize,
}

impl CountingTerminator {
    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionTerminator for CountingTerminator {
    async fn logout(&self) {
        self.logouts.fetch_add(1, Ordering::SeqCst);
    }
}
