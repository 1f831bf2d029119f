use nexium_core::CredentialStore;
use nexium_domain::Credential;
use parking_lot::RwLock;
use tracing::debug;

/// Process-local credential store.
///
/// Reads are frequent (every request) and writes rare (login, renewal,
/// logout), hence the read-write lock.
#[derive(Default)]
pub struct MemoryCredentialStore {
    credential: RwLock<Option<Credential>>,
}

impl MemoryCredentialStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with an existing credential, e.g. one restored at startup.
    pub fn with_credential(credential: Credential) -> Self {
        Self { credential: RwLock::new(Some(credential)) }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn read(&self) -> Option<Credential> {
        self.credential.read().clone()
    }

    fn replace(&self, access_token: String) {
        let mut credential = self.credential.write();
        let renewed = match credential.as_ref() {
            Some(current) => current.with_access_token(access_token),
            None => Credential::new(access_token),
        };
        *credential = Some(renewed);
        debug!("access token replaced");
    }

    fn set(&self, credential: Credential) {
        *self.credential.write() = Some(credential);
        debug!("credential installed");
    }

    fn clear(&self) {
        if self.credential.write().take().is_some() {
            debug!("credential cleared");
        }
    }
}
