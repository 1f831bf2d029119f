//! In-process stand-in for the API server

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use nexium_core::{ExchangeRequest, ExchangeResponse, Transport, TransportFailure};
use nexium_domain::Method;
use parking_lot::Mutex;
use serde_json::json;
use tokio::sync::Semaphore;

use super::RENEWAL_PATH;

/// How the renewal endpoint answers
#[derive(Debug, Clone)]
pub enum RenewalBehavior {
    /// Issue `token` and start accepting it
    Grant(String),
    /// Issue `token` but keep rejecting it
    GrantUnusable(String),
    /// Structured error response
    Refuse { status: u16, code: String },
    /// No response at all
    Unreachable,
    /// Never answer
    Hang,
}

/// One request as the backend saw it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seen {
    pub method: Method,
    pub url: String,
    pub bearer: Option<String>,
}

/// Fake API server.
///
/// Requests bearing the currently valid token get their configured response
/// (an echo of method and url by default); anything else gets a bare 401.
pub struct FakeBackend {
    valid_token: Mutex<String>,
    renewal: Mutex<RenewalBehavior>,
    routes: Mutex<HashMap<String, ExchangeResponse>>,
    public_routes: Mutex<HashMap<String, ExchangeResponse>>,
    seen: Mutex<Vec<Seen>>,
    bodies: Mutex<Vec<Option<serde_json::Value>>>,
    renewals: AtomicUsize,
    gate: Mutex<Option<Arc<Semaphore>>>,
    holds: Mutex<HashMap<String, Arc<Semaphore>>>,
}

impl FakeBackend {
    pub fn new(valid_token: &str) -> Self {
        Self {
            valid_token: Mutex::new(valid_token.to_string()),
            renewal: Mutex::new(RenewalBehavior::Grant("T2".to_string())),
            routes: Mutex::new(HashMap::new()),
            public_routes: Mutex::new(HashMap::new()),
            seen: Mutex::new(Vec::new()),
            bodies: Mutex::new(Vec::new()),
            renewals: AtomicUsize::new(0),
            gate: Mutex::new(None),
            holds: Mutex::new(HashMap::new()),
        }
    }

    pub fn set_renewal(&self, behavior: RenewalBehavior) {
        *self.renewal.lock() = behavior;
    }

    /// Answer `url` with `response` for authorized requests.
    pub fn route(&self, url: &str, response: ExchangeResponse) {
        self.routes.lock().insert(url.to_string(), response);
    }

    /// Answer `url` with `response` whatever the request carries.
    pub fn public_route(&self, url: &str, response: ExchangeResponse) {
        self.public_routes.lock().insert(url.to_string(), response);
    }

    /// Accept `token` from now on.
    pub fn accept(&self, token: &str) {
        *self.valid_token.lock() = token.to_string();
    }

    /// Hold renewal responses until [`FakeBackend::open_gate`].
    pub fn close_gate(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn open_gate(&self) {
        if let Some(gate) = self.gate.lock().as_ref() {
            gate.add_permits(1024);
        }
    }

    /// Hold requests to `url` after recording them, until
    /// [`FakeBackend::release`]. The answer is decided on release.
    pub fn hold(&self, url: &str) {
        self.holds.lock().insert(url.to_string(), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, url: &str) {
        if let Some(hold) = self.holds.lock().remove(url) {
            hold.add_permits(1024);
        }
    }

    /// Request bodies in arrival order
    pub fn bodies(&self) -> Vec<Option<serde_json::Value>> {
        self.bodies.lock().clone()
    }

    pub fn renewals(&self) -> usize {
        self.renewals.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().clone()
    }

    /// Requests to `url`, excluding renewals
    pub fn seen_for(&self, url: &str) -> Vec<Seen> {
        self.seen().into_iter().filter(|seen| seen.url == url).collect()
    }

    /// Urls of non-renewal requests sent with `token`, in arrival order
    pub fn urls_with(&self, token: &str) -> Vec<String> {
        self.seen()
            .into_iter()
            .filter(|seen| seen.url != RENEWAL_PATH && seen.bearer.as_deref() == Some(token))
            .map(|seen| seen.url)
            .collect()
    }

    async fn renew(&self) -> Result<ExchangeResponse, TransportFailure> {
        self.renewals.fetch_add(1, Ordering::SeqCst);

        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            let _permit = gate.acquire().await.map_err(|_| TransportFailure::new("gate closed"))?;
        }

        let behavior = self.renewal.lock().clone();
        match behavior {
            RenewalBehavior::Grant(token) => {
                *self.valid_token.lock() = token.clone();
                Ok(ExchangeResponse::json(200, json!({ "token": token })))
            }
            RenewalBehavior::GrantUnusable(token) => {
                Ok(ExchangeResponse::json(200, json!({ "accessToken": token })))
            }
            RenewalBehavior::Refuse { status, code } => {
                Ok(ExchangeResponse::json(status, json!({ "code": code, "error": "refused" })))
            }
            RenewalBehavior::Unreachable => Err(TransportFailure::new("connection refused")),
            RenewalBehavior::Hang => std::future::pending().await,
        }
    }
}

#[async_trait]
impl Transport for FakeBackend {
    async fn exchange(&self, request: ExchangeRequest) -> Result<ExchangeResponse, TransportFailure> {
        let bearer = request.bearer_token().map(str::to_string);
        self.seen.lock().push(Seen {
            method: request.method,
            url: request.url.clone(),
            bearer: bearer.clone(),
        });
        self.bodies.lock().push(request.body.clone());

        if request.url == RENEWAL_PATH {
            return self.renew().await;
        }

        let hold = self.holds.lock().get(&request.url).cloned();
        if let Some(hold) = hold {
            let _permit = hold.acquire().await.map_err(|_| TransportFailure::new("hold closed"))?;
        }
        if let Some(response) = self.public_routes.lock().get(&request.url).cloned() {
            return Ok(response);
        }

        let valid = self.valid_token.lock().clone();
        if bearer.as_deref() != Some(valid.as_str()) {
            return Ok(ExchangeResponse::empty(401));
        }

        let routed = self.routes.lock().get(&request.url).cloned();
        Ok(routed.unwrap_or_else(|| {
            ExchangeResponse::json(
                200,
                json!({ "method": request.method.as_str(), "url": request.url }),
            )
        }))
    }
}
