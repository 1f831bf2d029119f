//! Request descriptors

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::impl_wire_name_conversions;

/// HTTP methods the dispatcher issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read a resource
    Get,
    /// Create or act on a resource
    Post,
    /// Remove a resource
    Delete,
}

impl_wire_name_conversions!(Method {
    Get => "GET",
    Post => "POST",
    Delete => "DELETE",
});

/// Method/URL/body triple identifying one request.
///
/// Immutable once built; a deferred request is handed to the retry queue by
/// value and replayed from this exact descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    body: Option<Value>,
}

impl RequestDescriptor {
    /// Descriptor for an arbitrary method
    pub fn new(method: Method, url: impl Into<String>, body: Option<Value>) -> Self {
        Self { method, url: url.into(), body }
    }

    /// `GET url`, no body
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url, None)
    }

    /// `POST url` with an optional JSON body
    pub fn post(url: impl Into<String>, body: Option<Value>) -> Self {
        Self::new(Method::Post, url, body)
    }

    /// `DELETE url`, no body
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::Delete, url, None)
    }

    /// HTTP method
    pub fn method(&self) -> Method {
        self.method
    }

    /// Url as given, absolute or relative
    pub fn url(&self) -> &str {
        &self.url
    }

    /// JSON body, if any
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}
