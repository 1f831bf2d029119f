use std::time::Duration;

use async_trait::async_trait;
use nexium_core::{ExchangeRequest, ExchangeResponse, ResponseBody, Transport, TransportFailure};
use nexium_domain::{ApiConfig, Method, NexiumError, Result};
use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};
use reqwest::redirect::Policy;
use reqwest::Client as ReqwestClient;
use tracing::debug;
use url::Url;

use crate::errors::{transport_failure, InfraError};

/// [`Transport`] over HTTP.
///
/// Relative request urls are joined onto the base url. Redirects are not
/// followed; a 3xx answer is a transport failure. Every request carries
/// `Cache-Control: no-cache`.
#[derive(Clone)]
pub struct HttpTransport {
    client: ReqwestClient,
    base_url: Url,
}

impl HttpTransport {
    /// Start building a transport for `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HttpTransportBuilder {
        HttpTransportBuilder::new(base_url)
    }

    /// Build from the `[api]` section of the client configuration.
    ///
    /// # Errors
    /// Returns `NexiumError::Config` for an invalid base url.
    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        let mut builder = Self::builder(config.base_url.clone()).timeout(config.request_timeout());
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        builder.build()
    }

    /// Base that relative request urls are joined onto
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Absolute urls pass through; anything else is joined onto the base url.
    ///
    /// # Errors
    /// Returns a transport failure if the result is not a valid url.
    pub fn resolve(&self, url: &str) -> std::result::Result<Url, TransportFailure> {
        match Url::parse(url) {
            Ok(absolute) => Ok(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => self
                .base_url
                .join(url)
                .map_err(|err| TransportFailure::new(format!("invalid request url {url:?}: {err}"))),
            Err(err) => Err(TransportFailure::new(format!("invalid request url {url:?}: {err}"))),
        }
    }
}

fn to_reqwest(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn exchange(
        &self,
        request: ExchangeRequest,
    ) -> std::result::Result<ExchangeResponse, TransportFailure> {
        let url = self.resolve(&request.url)?;
        let method = to_reqwest(request.method);
        debug!(%method, %url, "sending HTTP request");

        let mut builder = self.client.request(method.clone(), url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|err| {
            debug!(%method, %url, error = %err, "HTTP request failed");
            transport_failure(&err)
        })?;

        let status = response.status();
        debug!(%method, %url, %status, "received HTTP response");

        if status.is_redirection() {
            return Err(TransportFailure::new(format!(
                "http redirect rejected ({url}): status {status}"
            )));
        }

        let bytes = response.bytes().await.map_err(|err| transport_failure(&err))?;
        Ok(ExchangeResponse::new(status.as_u16(), ResponseBody::from_bytes(&bytes)))
    }
}

/// Builder for [`HttpTransport`].
#[derive(Debug)]
pub struct HttpTransportBuilder {
    base_url: String,
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<HeaderMap>,
}

impl HttpTransportBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            user_agent: None,
            default_headers: None,
        }
    }

    /// Per-request timeout (default 30s)
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `User-Agent` sent with every request
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Extra headers sent with every request.
    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// # Errors
    /// Returns `NexiumError::Config` for an invalid base url or client setup.
    pub fn build(self) -> Result<HttpTransport> {
        let base_url = Url::parse(&self.base_url).map_err(|err| {
            let infra: InfraError = err.into();
            NexiumError::from(infra)
        })?;
        if base_url.cannot_be_a_base() {
            return Err(NexiumError::Config(format!("base url cannot be a base: {base_url}")));
        }

        let mut headers = self.default_headers.unwrap_or_default();
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let mut builder = ReqwestClient::builder()
            .timeout(self.timeout)
            .redirect(Policy::none())
            .default_headers(headers)
            .no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            NexiumError::from(infra)
        })?;

        Ok(HttpTransport { client, base_url })
    }
}
