//! Single-flight session renewal
//!
//! However many requests discover an expired credential at the same time,
//! exactly one renewal exchange is issued. The first caller starts a renewal
//! cycle; everyone arriving while it runs is parked in the cycle's
//! [`RetryQueue`] and resolved from that one outcome.
//!
//! ```text
//!            request_renewal / renew_now
//!   ┌──────┐ ─────────────────────────────► ┌──────────┐
//!   │ Idle │                                │ Renewing │ ◄── enqueue
//!   └──────┘ ◄───────────────────────────── └──────────┘
//!        success: replace credential, drain & replay, then Idle
//!        failure/timeout: clear credential, drain & fail, Idle, logout
//! ```
//!
//! The cycle itself runs on a spawned task, so dropping the caller that
//! triggered it cannot leave the state stuck in `Renewing`. Every transition
//! happens under one mutex that is never held across an `.await`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use nexium_domain::constants::ACCESS_DENIED_CODE;
use nexium_domain::{
    impl_wire_name_conversions, Credential, DispatchError, DispatchResult, RenewalGrant,
    RequestDescriptor,
};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::queue::{CompletionReceiver, DrainOutcome, RetryQueue};
use super::taxonomy::error_code;
use super::transport::TransportClient;
use crate::ports::{CredentialStore, ExchangeResponse, SessionTerminator};

/// Renewal state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalState {
    /// No renewal in flight; requests go straight to the transport
    Idle,
    /// One renewal exchange in flight; requests are queued behind it
    Renewing,
}

impl_wire_name_conversions!(RenewalState {
    Idle => "idle",
    Renewing => "renewing",
});

/// What a caller that saw an expired credential should do next
pub enum RenewalTicket {
    /// This caller started the cycle; its own result arrives on the receiver
    Started(CompletionReceiver),
    /// A cycle was already running; the request was queued behind it
    Enqueued(CompletionReceiver),
    /// The credential was replaced since the caller sent its request
    AlreadyRenewed(Credential),
    /// Nothing to renew with: the session is already gone
    NoCredential,
}

/// Why a renewal cycle failed. Every variant is terminal for the session.
#[derive(Debug, Error)]
enum RenewalFailure {
    #[error("no credential to renew")]
    NoCredential,

    #[error("renewal timed out after {0:?}")]
    TimedOut(Duration),

    #[error("renewal transport failure: {0}")]
    Transport(String),

    #[error("renewal refused (status {status}, code {code:?})")]
    Refused { status: u16, code: Option<String> },

    #[error("renewal response carried no credential: {0}")]
    MalformedGrant(String),
}

enum Phase {
    Idle,
    Renewing { queue: Arc<RetryQueue> },
}

type Joiner = oneshot::Sender<DispatchResult<()>>;

/// Mutable renewal state guarded by the renewer's mutex.
///
/// `epoch` changes whenever a cycle starts or the session is terminated; a
/// cycle only commits its result while the epoch it started with is current.
/// `joiners` are proactive callers waiting on the running cycle's outcome.
struct Cycle {
    phase: Phase,
    epoch: u64,
    joiners: Vec<Joiner>,
}

impl Cycle {
    /// Enter Renewing with a fresh queue; returns the new epoch.
    fn begin(&mut self) -> (u64, Arc<RetryQueue>) {
        let queue = Arc::new(RetryQueue::new());
        self.epoch += 1;
        self.phase = Phase::Renewing { queue: Arc::clone(&queue) };
        (self.epoch, queue)
    }

    /// Return to Idle, handing back whoever was waiting on the cycle.
    fn finish(&mut self) -> Vec<Joiner> {
        self.phase = Phase::Idle;
        std::mem::take(&mut self.joiners)
    }
}

fn notify(joiners: Vec<Joiner>, result: &DispatchResult<()>) {
    for joiner in joiners {
        // A joiner that stopped waiting has nothing left to tell.
        let _ = joiner.send(result.clone());
    }
}

/// The request whose 401 started a cycle; replayed after the queue drains
struct Trigger {
    descriptor: RequestDescriptor,
    completion: oneshot::Sender<DispatchResult>,
}

impl Trigger {
    fn resolve(self, result: DispatchResult) {
        if self.completion.send(result).is_err() {
            debug!(url = self.descriptor.url(), "renewal trigger went away before completion");
        }
    }
}

struct RenewerInner {
    cycle: Mutex<Cycle>,
    store: Arc<dyn CredentialStore>,
    client: TransportClient,
    terminator: Arc<dyn SessionTerminator>,
    renewal_path: String,
    renewal_timeout: Duration,
    renewals_issued: AtomicU64,
}

/// Coordinator guaranteeing at most one renewal exchange in flight
#[derive(Clone)]
pub struct SingleFlightRenewer {
    inner: Arc<RenewerInner>,
}

impl SingleFlightRenewer {
    /// Renewer issuing `POST renewal_path`, bounded by `renewal_timeout`
    pub fn new(
        store: Arc<dyn CredentialStore>,
        client: TransportClient,
        terminator: Arc<dyn SessionTerminator>,
        renewal_path: impl Into<String>,
        renewal_timeout: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(RenewerInner {
                cycle: Mutex::new(Cycle { phase: Phase::Idle, epoch: 0, joiners: Vec::new() }),
                store,
                client,
                terminator,
                renewal_path: renewal_path.into(),
                renewal_timeout,
                renewals_issued: AtomicU64::new(0),
            }),
        }
    }

    /// Current renewal state
    pub fn state(&self) -> RenewalState {
        match self.inner.cycle.lock().phase {
            Phase::Idle => RenewalState::Idle,
            Phase::Renewing { .. } => RenewalState::Renewing,
        }
    }

    /// Whether there is a session to renew
    pub fn has_credential(&self) -> bool {
        self.inner.store.read().is_some()
    }

    /// Number of renewal exchanges issued so far
    pub fn renewals_issued(&self) -> u64 {
        self.inner.renewals_issued.load(Ordering::SeqCst)
    }

    /// Number of requests parked behind the running cycle
    pub fn queued(&self) -> usize {
        match &self.inner.cycle.lock().phase {
            Phase::Idle => 0,
            Phase::Renewing { queue } => queue.len(),
        }
    }

    /// Queue `descriptor` if a cycle is running; `None` when idle.
    pub fn enqueue_if_renewing(&self, descriptor: &RequestDescriptor) -> Option<CompletionReceiver> {
        let cycle = self.inner.cycle.lock();
        match &cycle.phase {
            Phase::Renewing { queue } => Some(queue.enqueue(descriptor.clone())),
            Phase::Idle => None,
        }
    }

    /// Called by a request that was answered 401 while sending with `used`.
    ///
    /// The Idle → Renewing check-and-set happens under the state lock, so two
    /// callers can never both start a cycle.
    pub fn request_renewal(
        &self,
        trigger: RequestDescriptor,
        used: Option<&Credential>,
    ) -> RenewalTicket {
        let (epoch, queue, completion, receiver) = {
            let mut cycle = self.inner.cycle.lock();

            if let Phase::Renewing { queue } = &cycle.phase {
                return RenewalTicket::Enqueued(queue.enqueue(trigger));
            }

            let Some(current) = self.inner.store.read() else {
                return RenewalTicket::NoCredential;
            };
            if used.map(Credential::access_token) != Some(current.access_token()) {
                return RenewalTicket::AlreadyRenewed(current);
            }

            let (epoch, queue) = cycle.begin();
            let (completion, receiver) = oneshot::channel();
            (epoch, queue, completion, receiver)
        };

        self.spawn_cycle(epoch, queue, Some(Trigger { descriptor: trigger, completion }));
        RenewalTicket::Started(receiver)
    }

    /// Renew proactively, without a request attached.
    ///
    /// Joins the running cycle if there is one, otherwise starts one, and
    /// waits for its outcome.
    ///
    /// # Errors
    /// Returns `SessionExpired` when there is no credential or renewal fails.
    pub async fn renew_now(&self) -> DispatchResult<()> {
        let (joiner, receiver) = oneshot::channel();
        let started = {
            let mut cycle = self.inner.cycle.lock();

            match cycle.phase {
                Phase::Renewing { .. } => {
                    debug!("joining renewal already in flight");
                    cycle.joiners.push(joiner);
                    None
                }
                Phase::Idle => {
                    if self.inner.store.read().is_none() {
                        return Err(DispatchError::SessionExpired);
                    }
                    cycle.joiners.push(joiner);
                    Some(cycle.begin())
                }
            }
        };

        if let Some((epoch, queue)) = started {
            self.spawn_cycle(epoch, queue, None);
        }
        receiver.await.unwrap_or(Err(DispatchError::SessionExpired))
    }

    /// Install a credential obtained outside renewal, such as a fresh login.
    ///
    /// The write happens under the state lock and moves to a new epoch, so a
    /// renewal still running for the previous session can neither overwrite
    /// nor clear it. Requests queued behind that renewal belonged to the old
    /// session and fail with `SessionExpired`. Logout is not signaled.
    pub fn install(&self, credential: Credential) {
        let (queue, joiners) = {
            let mut cycle = self.inner.cycle.lock();
            cycle.epoch += 1;
            self.inner.store.set(credential);
            let joiners = std::mem::take(&mut cycle.joiners);

            match std::mem::replace(&mut cycle.phase, Phase::Idle) {
                Phase::Renewing { queue } => (Some(queue), joiners),
                Phase::Idle => (None, joiners),
            }
        };

        notify(joiners, &Ok(()));
        if let Some(queue) = queue {
            let failed = queue.drain_and_fail(&DispatchError::SessionExpired);
            info!(failed, "new session installed; superseded renewal discarded");
        }
    }

    /// End the session locally: clear the credential, fail queued requests,
    /// discard any in-flight renewal and signal logout.
    ///
    /// Logout is signaled only if there was a session to end. Returns whether
    /// it was.
    pub async fn terminate(&self) -> bool {
        self.end_session(None).await
    }

    /// Shared by explicit termination and replay rejection. With `epoch` set,
    /// nothing happens unless that cycle's session is still the current one.
    async fn end_session(&self, epoch: Option<u64>) -> bool {
        let (had_session, queue, joiners) = {
            let mut cycle = self.inner.cycle.lock();
            if epoch.is_some_and(|epoch| epoch != cycle.epoch) {
                return false;
            }
            cycle.epoch += 1;
            let previous = std::mem::replace(&mut cycle.phase, Phase::Idle);
            let joiners = std::mem::take(&mut cycle.joiners);
            let had_credential = self.inner.store.read().is_some();
            self.inner.store.clear();

            match previous {
                Phase::Renewing { queue } => (true, Some(queue), joiners),
                Phase::Idle => (had_credential, None, joiners),
            }
        };

        notify(joiners, &Err(DispatchError::SessionExpired));
        if let Some(queue) = queue {
            let failed = queue.drain_and_fail(&DispatchError::SessionExpired);
            debug!(failed, "failed queued requests on session termination");
        }

        if had_session {
            info!("session terminated");
            self.inner.terminator.logout().await;
        }

        had_session
    }

    fn spawn_cycle(&self, epoch: u64, queue: Arc<RetryQueue>, trigger: Option<Trigger>) {
        let renewer = self.clone();
        let span = info_span!("renewal_cycle", cycle_id = %Uuid::new_v4(), epoch);
        tokio::spawn(async move { renewer.run_cycle(epoch, queue, trigger).await }.instrument(span));
    }

    async fn run_cycle(&self, epoch: u64, queue: Arc<RetryQueue>, trigger: Option<Trigger>) {
        let expired = |trigger: Option<Trigger>| {
            if let Some(trigger) = trigger {
                trigger.resolve(Err(DispatchError::SessionExpired));
            }
        };

        let access_token = match self.renew().await {
            Ok(access_token) => access_token,
            Err(failure) => {
                if matches!(&failure, RenewalFailure::Refused { code: Some(code), .. } if code == ACCESS_DENIED_CODE)
                {
                    info!("renewal credential rejected by server");
                }
                warn!(error = %failure, "session renewal failed");
                self.fail_cycle(epoch, &queue).await;
                expired(trigger);
                return;
            }
        };

        let Some(credential) = self.commit(epoch, access_token) else {
            debug!("session terminated during renewal; discarding renewed credential");
            expired(trigger);
            return;
        };
        info!("session renewed");

        match self.drain(epoch, &queue, &credential).await {
            Drained::Idle => {}
            Drained::Terminated => {
                expired(trigger);
                return;
            }
            Drained::Rejected => {
                warn!("renewed credential rejected during replay");
                self.fail_cycle(epoch, &queue).await;
                expired(trigger);
                return;
            }
        }

        let Some(trigger) = trigger else {
            return;
        };
        let classification = self.inner.client.send(&trigger.descriptor, Some(&credential)).await;
        let result = if classification.is_credential_expired() {
            warn!(url = trigger.descriptor.url(), "renewed credential rejected on replay");
            self.end_session(Some(epoch)).await;
            Err(DispatchError::SessionExpired)
        } else {
            classification.into_result()
        };
        trigger.resolve(result);
    }

    /// Issue the single renewal exchange, bounded by the renewal timeout.
    async fn renew(&self) -> Result<String, RenewalFailure> {
        let credential = self.inner.store.read().ok_or(RenewalFailure::NoCredential)?;
        self.inner.renewals_issued.fetch_add(1, Ordering::SeqCst);

        let exchange =
            self.inner.client.renew(&self.inner.renewal_path, credential.renewal_token());
        let response = tokio::time::timeout(self.inner.renewal_timeout, exchange)
            .await
            .map_err(|_| RenewalFailure::TimedOut(self.inner.renewal_timeout))?
            .map_err(|failure| RenewalFailure::Transport(failure.0))?;

        Self::read_grant(response)
    }

    fn read_grant(response: ExchangeResponse) -> Result<String, RenewalFailure> {
        if !response.is_success() {
            return Err(RenewalFailure::Refused {
                status: response.status,
                code: error_code(&response.body),
            });
        }

        let body = response
            .body
            .json()
            .cloned()
            .ok_or_else(|| RenewalFailure::MalformedGrant("empty body".to_string()))?;
        let grant: RenewalGrant = serde_json::from_value(body)
            .map_err(|err| RenewalFailure::MalformedGrant(err.to_string()))?;

        if grant.access_token.is_empty() {
            return Err(RenewalFailure::MalformedGrant("empty access token".to_string()));
        }
        Ok(grant.access_token)
    }

    /// Write the renewed token if this cycle is still current.
    fn commit(&self, epoch: u64, access_token: String) -> Option<Credential> {
        let cycle = self.inner.cycle.lock();
        if cycle.epoch != epoch {
            return None;
        }
        self.inner.store.replace(access_token);
        self.inner.store.read()
    }

    /// Replay the cycle's queue until it is observed empty under the state
    /// lock, then go Idle.
    async fn drain(&self, epoch: u64, queue: &RetryQueue, credential: &Credential) -> Drained {
        let mut replayed = 0;
        loop {
            match queue.drain_and_replay(&self.inner.client, credential).await {
                DrainOutcome::Replayed(count) => replayed += count,
                DrainOutcome::CredentialRejected { .. } => return Drained::Rejected,
            }

            let joiners = {
                let mut cycle = self.inner.cycle.lock();
                if cycle.epoch != epoch {
                    // Superseded by termination or a new session, which
                    // already failed whatever was left.
                    return Drained::Terminated;
                }
                if !queue.is_empty() {
                    continue;
                }
                cycle.finish()
            };

            debug!(replayed, "queue drained");
            notify(joiners, &Ok(()));
            return Drained::Idle;
        }
    }

    /// Tear the session down after a failed cycle, unless something else
    /// already did.
    async fn fail_cycle(&self, epoch: u64, queue: &RetryQueue) {
        let joiners = {
            let mut cycle = self.inner.cycle.lock();
            if cycle.epoch != epoch {
                // Superseded by termination or a new session.
                return;
            }
            cycle.epoch += 1;
            self.inner.store.clear();
            cycle.finish()
        };

        notify(joiners, &Err(DispatchError::SessionExpired));
        let failed = queue.drain_and_fail(&DispatchError::SessionExpired);
        debug!(failed, "failed queued requests after renewal failure");
        self.inner.terminator.logout().await;
    }
}

enum Drained {
    Idle,
    Rejected,
    Terminated,
}
