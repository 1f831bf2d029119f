//! Fully wired client
//!
//! ```no_run
//! use nexium_domain::{AuthMethod, ClientConfig};
//! use nexium_infra::NexiumClient;
//!
//! # async fn example() -> nexium_domain::Result<()> {
//! let client = NexiumClient::from_config(ClientConfig::default())?;
//! let mut events = client.subscribe();
//!
//! if let Ok(account) = client.accounts().login("ada", &AuthMethod::password("secret")).await {
//!     tracing::info!(username = %account.username, "signed in");
//! }
//! let _items = client.get("/api/items").await;
//!
//! // Fires when the session can no longer be renewed.
//! let _ = events.recv().await;
//! client.shutdown().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use nexium_core::{
    AccountService, CredentialStore, RequestDispatcher, SessionRefresher, SessionTerminator,
    Transport,
};
use nexium_domain::{ClientConfig, Credential, DispatchResult, Result};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::info;

use crate::credentials::MemoryCredentialStore;
use crate::http::HttpTransport;
use crate::session::{BroadcastSessionTerminator, SessionEvent};

/// Dispatcher, account service and background refresh over HTTP
pub struct NexiumClient {
    config: ClientConfig,
    dispatcher: RequestDispatcher,
    accounts: AccountService,
    events: BroadcastSessionTerminator,
    refresher: Option<SessionRefresher>,
}

impl NexiumClient {
    /// Start assembling a client from `config`
    pub fn builder(config: ClientConfig) -> NexiumClientBuilder {
        NexiumClientBuilder::new(config)
    }

    /// Build with the default HTTP transport and in-memory store.
    ///
    /// Must be called within a Tokio runtime when a refresh interval is set.
    ///
    /// # Errors
    /// Returns `NexiumError::Config` for invalid configuration.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Configuration the client was built from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Dispatcher for requests beyond the shorthands below
    pub fn dispatcher(&self) -> &RequestDispatcher {
        &self.dispatcher
    }

    /// Login, registration, whoami and logout
    pub fn accounts(&self) -> &AccountService {
        &self.accounts
    }

    /// Session lifecycle events, `Terminated` on logout or failed renewal
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Whether background refresh is running
    pub fn is_refreshing(&self) -> bool {
        self.refresher.as_ref().is_some_and(SessionRefresher::is_running)
    }

    /// See [`RequestDispatcher::get`]
    pub async fn get(&self, url: &str) -> DispatchResult {
        self.dispatcher.get(url).await
    }

    /// See [`RequestDispatcher::post`]
    pub async fn post(&self, url: &str, body: Option<Value>) -> DispatchResult {
        self.dispatcher.post(url, body).await
    }

    /// See [`RequestDispatcher::remove`]
    pub async fn remove(&self, url: &str) -> DispatchResult {
        self.dispatcher.remove(url).await
    }

    /// Stop background refresh. The session itself is left as is.
    ///
    /// # Errors
    /// Returns `NexiumError::Internal` if the refresher fails to stop.
    pub async fn shutdown(mut self) -> Result<()> {
        if let Some(refresher) = self.refresher.as_mut() {
            refresher.stop().await?;
        }
        Ok(())
    }
}

/// Builder for [`NexiumClient`]; every collaborator can be swapped out.
pub struct NexiumClientBuilder {
    config: ClientConfig,
    transport: Option<Arc<dyn Transport>>,
    store: Option<Arc<dyn CredentialStore>>,
    credential: Option<Credential>,
}

impl NexiumClientBuilder {
    fn new(config: ClientConfig) -> Self {
        Self { config, transport: None, store: None, credential: None }
    }

    /// Use `transport` instead of the reqwest-backed default
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use `store` instead of the in-memory default
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Start from a previously obtained credential.
    pub fn credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// # Errors
    /// Returns `NexiumError::Config` for invalid configuration, or
    /// `NexiumError::Internal` when background refresh is configured but no
    /// Tokio runtime is running.
    pub fn build(self) -> Result<NexiumClient> {
        let config = self.config;
        config.validate()?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&config.api)?),
        };
        let store: Arc<dyn CredentialStore> =
            self.store.unwrap_or_else(|| Arc::new(MemoryCredentialStore::new()));
        if let Some(credential) = self.credential {
            store.set(credential);
        }

        let events = BroadcastSessionTerminator::new();
        let terminator: Arc<dyn SessionTerminator> = Arc::new(events.clone());

        let dispatcher = RequestDispatcher::new(
            store,
            transport,
            terminator,
            config.session.renewal_path.clone(),
            config.session.renewal_timeout(),
        );
        let accounts = AccountService::new(dispatcher.clone());

        let refresher = match config.session.refresh_interval() {
            Some(interval) => {
                let mut refresher = SessionRefresher::new(dispatcher.renewer().clone(), interval);
                refresher.start()?;
                Some(refresher)
            }
            None => None,
        };

        info!(
            base_url = %config.api.base_url,
            refresh = refresher.is_some(),
            "nexium client ready"
        );

        Ok(NexiumClient { config, dispatcher, accounts, events, refresher })
    }
}
