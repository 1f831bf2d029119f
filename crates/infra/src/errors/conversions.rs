//! Conversions from external infrastructure errors into domain errors.

use nexium_core::TransportFailure;
use nexium_domain::NexiumError;
use reqwest::Error as HttpError;
use url::ParseError as UrlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub NexiumError);

impl From<InfraError> for NexiumError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<NexiumError> for InfraError {
    fn from(value: NexiumError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoNexiumError {
    fn into_nexium(self) -> NexiumError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → NexiumError */
/* -------------------------------------------------------------------------- */

impl IntoNexiumError for HttpError {
    fn into_nexium(self) -> NexiumError {
        if self.is_builder() {
            return NexiumError::Config(format!("invalid http client configuration: {self}"));
        }
        NexiumError::Network(describe_http_error(&self))
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_nexium())
    }
}

/* -------------------------------------------------------------------------- */
/* url::ParseError → NexiumError */
/* -------------------------------------------------------------------------- */

impl IntoNexiumError for UrlError {
    fn into_nexium(self) -> NexiumError {
        NexiumError::Config(format!("invalid url: {self}"))
    }
}

impl From<UrlError> for InfraError {
    fn from(value: UrlError) -> Self {
        InfraError(value.into_nexium())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → TransportFailure */
/* -------------------------------------------------------------------------- */

/// Map a failed exchange onto the transport failure the dispatcher classifies.
pub fn transport_failure(err: &HttpError) -> TransportFailure {
    TransportFailure::new(describe_http_error(err))
}

fn describe_http_error(err: &HttpError) -> String {
    let kind = if err.is_timeout() {
        "timed out"
    } else if err.is_connect() {
        "connection failed"
    } else if err.is_redirect() {
        "redirect rejected"
    } else if err.is_decode() || err.is_body() {
        "failed to read response body"
    } else {
        "request failed"
    };

    match err.url() {
        Some(url) => format!("http {kind} ({url}): {err}"),
        None => format!("http {kind}: {err}"),
    }
}
