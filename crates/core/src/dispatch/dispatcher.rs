//! Authenticated request dispatch

use std::sync::Arc;
use std::time::Duration;

use nexium_domain::{Credential, DispatchError, DispatchResult, Method, RequestDescriptor};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

use super::queue::CompletionReceiver;
use super::renewer::{RenewalTicket, SingleFlightRenewer};
use super::transport::TransportClient;
use crate::ports::{CredentialStore, SessionTerminator, Transport};

/// Retries allowed when the credential changes between sending a request and
/// handling its 401. Each retry means another renewal completed in between.
const MAX_STALE_RETRIES: usize = 3;

/// Entry point for authenticated requests
///
/// Every call resolves exactly once with the decoded body or a
/// [`DispatchError`]. An expired credential is renewed behind the caller's
/// back; the caller only ever sees [`DispatchError::SessionExpired`] if that
/// renewal fails.
#[derive(Clone)]
pub struct RequestDispatcher {
    store: Arc<dyn CredentialStore>,
    client: TransportClient,
    renewer: SingleFlightRenewer,
}

impl RequestDispatcher {
    /// Wire a dispatcher and its renewer over the given collaborators.
    ///
    /// # Arguments
    /// * `renewal_path` - path of the session renewal endpoint
    /// * `renewal_timeout` - upper bound on one renewal exchange
    pub fn new(
        store: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
        terminator: Arc<dyn SessionTerminator>,
        renewal_path: impl Into<String>,
        renewal_timeout: Duration,
    ) -> Self {
        let client = TransportClient::new(transport);
        let renewer = SingleFlightRenewer::new(
            Arc::clone(&store),
            client.clone(),
            terminator,
            renewal_path,
            renewal_timeout,
        );
        Self { store, client, renewer }
    }

    /// Renewer shared with every clone of this dispatcher
    pub fn renewer(&self) -> &SingleFlightRenewer {
        &self.renewer
    }

    /// Store the dispatcher reads and the renewer writes
    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// `GET url`
    pub async fn get(&self, url: &str) -> DispatchResult {
        self.dispatch(RequestDescriptor::get(url)).await
    }

    /// `POST url` with an optional JSON body
    pub async fn post(&self, url: &str, body: Option<Value>) -> DispatchResult {
        self.dispatch(RequestDescriptor::post(url, body)).await
    }

    /// `DELETE url`
    pub async fn remove(&self, url: &str) -> DispatchResult {
        self.dispatch(RequestDescriptor::delete(url)).await
    }

    /// `GET url`, decoding the success body into `T`.
    ///
    /// # Errors
    /// Any dispatch error, or `Transport` if the body does not decode.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> DispatchResult<T> {
        decode_body(self.get(url).await?)
    }

    /// `POST url` with `body` serialized to JSON, decoding the success body
    /// into `T`.
    ///
    /// # Errors
    /// Any dispatch error, or `Transport` if either body fails to convert.
    pub async fn post_json<B, T>(&self, url: &str, body: &B) -> DispatchResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body)
            .map_err(|err| DispatchError::transport(format!("failed to encode request body: {err}")))?;
        decode_body(self.post(url, Some(body)).await?)
    }

    /// Issue `descriptor` under the renewal protocol.
    ///
    /// # Errors
    /// * `Api` - the server answered with a structured error
    /// * `Transport` - no usable response, or an empty url
    /// * `SessionExpired` - the credential could not be renewed
    #[instrument(skip(self, descriptor), fields(method = %descriptor.method(), url = descriptor.url()))]
    pub async fn dispatch(&self, descriptor: RequestDescriptor) -> DispatchResult {
        if descriptor.url().trim().is_empty() {
            return Err(DispatchError::transport("request url must not be empty"));
        }

        for _ in 0..=MAX_STALE_RETRIES {
            if let Some(receiver) = self.renewer.enqueue_if_renewing(&descriptor) {
                return await_completion(receiver).await;
            }

            let credential = self.store.read();
            let classification = self.client.send(&descriptor, credential.as_ref()).await;
            if !classification.is_credential_expired() {
                return classification.into_result();
            }

            match self.renewer.request_renewal(descriptor.clone(), credential.as_ref()) {
                RenewalTicket::Started(receiver) => {
                    debug!("credential expired; renewal started");
                    return await_completion(receiver).await;
                }
                RenewalTicket::Enqueued(receiver) => {
                    debug!("credential expired; waiting on renewal in flight");
                    return await_completion(receiver).await;
                }
                RenewalTicket::AlreadyRenewed(_) => {
                    debug!("credential replaced since request was sent; retrying");
                }
                RenewalTicket::NoCredential => return Err(DispatchError::SessionExpired),
            }
        }

        Err(DispatchError::transport("credential kept changing while the request was retried"))
    }

    /// Issue `descriptor` with no credential and outside the renewal protocol.
    ///
    /// Used for login and registration, where a 401 is the server's answer
    /// rather than an expired credential.
    #[instrument(skip(self, descriptor), fields(method = %descriptor.method(), url = descriptor.url()))]
    pub async fn send_unauthenticated(&self, descriptor: RequestDescriptor) -> DispatchResult {
        if descriptor.url().trim().is_empty() {
            return Err(DispatchError::transport("request url must not be empty"));
        }
        self.client.send_unauthenticated(&descriptor).await.into_result()
    }

    /// Install a credential obtained outside the dispatcher (login).
    ///
    /// Goes through the renewer so a renewal left over from the previous
    /// session cannot touch the new credential.
    pub fn install_credential(&self, credential: Credential) {
        self.renewer.install(credential);
    }

    /// Whether a session credential is currently held
    pub fn has_credential(&self) -> bool {
        self.store.read().is_some()
    }

    /// Shorthand for a descriptor with an arbitrary method
    pub async fn request(&self, method: Method, url: &str, body: Option<Value>) -> DispatchResult {
        self.dispatch(RequestDescriptor::new(method, url, body)).await
    }
}

async fn await_completion(receiver: CompletionReceiver) -> DispatchResult {
    receiver
        .await
        .unwrap_or_else(|_| Err(DispatchError::transport("renewal cycle aborted before completion")))
}

/// Decode a success body into `T`.
pub fn decode_body<T: DeserializeOwned>(body: Value) -> DispatchResult<T> {
    serde_json::from_value(body)
        .map_err(|err| DispatchError::transport(format!("failed to decode response body: {err}")))
}
