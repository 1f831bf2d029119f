//! Shared helpers for `nexium-infra` integration tests.

#![allow(dead_code)]

use nexium_domain::{ClientConfig, Credential};
use nexium_infra::NexiumClient;
use serde_json::Value;
use wiremock::{MockServer, Request};

/// Client pointed at `server`, optionally holding `credential`.
pub fn client_for(server: &MockServer, credential: Option<Credential>) -> NexiumClient {
    client_with(server, credential, |_| {})
}

/// Like [`client_for`], with a hook to adjust the configuration first.
pub fn client_with(
    server: &MockServer,
    credential: Option<Credential>,
    configure: impl FnOnce(&mut ClientConfig),
) -> NexiumClient {
    let mut config = ClientConfig::default();
    config.api.base_url = server.uri();
    config.api.request_timeout_secs = 5;
    config.session.renewal_timeout_secs = 5;
    configure(&mut config);

    let mut builder = NexiumClient::builder(config);
    if let Some(credential) = credential {
        builder = builder.credential(credential);
    }
    builder.build().expect("client should build")
}

/// Requests the server received for `path`
pub async fn received_for(server: &MockServer, path: &str) -> Vec<Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == path)
        .collect()
}

pub fn header<'a>(request: &'a Request, name: &str) -> Option<&'a str> {
    request.headers.get(name).and_then(|value| value.to_str().ok())
}

pub fn json_body(request: &Request) -> Value {
    serde_json::from_slice(&request.body).expect("request body should be JSON")
}
