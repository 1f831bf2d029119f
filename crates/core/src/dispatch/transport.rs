//! Thin adapter over the [`Transport`] port
//!
//! Turns descriptors into exchanges, attaches the bearer credential and runs
//! the result through the taxonomy.

use std::sync::Arc;

use nexium_domain::constants::{CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE};
use nexium_domain::{Credential, Method, RequestDescriptor};
use tracing::debug;

use super::taxonomy::{classify_outcome, classify_unauthenticated, Classification};
use crate::ports::{ExchangeRequest, ExchangeResponse, Transport, TransportFailure};

/// Cloneable handle that issues classified exchanges
#[derive(Clone)]
pub struct TransportClient {
    transport: Arc<dyn Transport>,
}

impl TransportClient {
    /// Client issuing exchanges over `transport`
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    fn request_for(descriptor: &RequestDescriptor) -> ExchangeRequest {
        ExchangeRequest::from_descriptor(descriptor)
            .with_header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE)
    }

    /// Issue `descriptor` with the credential's access token attached.
    pub async fn send(
        &self,
        descriptor: &RequestDescriptor,
        credential: Option<&Credential>,
    ) -> Classification {
        let request =
            Self::request_for(descriptor).with_bearer(credential.map(Credential::access_token));

        debug!(
            method = %descriptor.method(),
            url = descriptor.url(),
            authorized = credential.is_some(),
            "sending request"
        );

        classify_outcome(self.transport.exchange(request).await)
    }

    /// Issue `descriptor` without any credential; a 401 is an application error.
    pub async fn send_unauthenticated(&self, descriptor: &RequestDescriptor) -> Classification {
        debug!(method = %descriptor.method(), url = descriptor.url(), "sending unauthenticated request");

        match self.transport.exchange(Self::request_for(descriptor)).await {
            Ok(response) => classify_unauthenticated(response),
            Err(TransportFailure(message)) => Classification::TransportError(message),
        }
    }

    /// Raw renewal exchange: `POST path` authorized with `token`, no body.
    pub async fn renew(
        &self,
        path: &str,
        token: &str,
    ) -> Result<ExchangeResponse, TransportFailure> {
        let request = ExchangeRequest::new(Method::Post, path)
            .with_header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE)
            .with_bearer(Some(token));

        debug!(url = path, "sending renewal request");

        self.transport.exchange(request).await
    }
}
