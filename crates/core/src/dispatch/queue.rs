//! Requests deferred while a renewal is in flight
//!
//! Each entry pairs a descriptor with a single-use completion channel. The
//! `oneshot::Sender` is consumed on send, so an entry can be resolved at most
//! once by construction.

use std::collections::VecDeque;

use nexium_domain::{Credential, DispatchError, DispatchResult, RequestDescriptor};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use super::transport::TransportClient;

/// Receiving half handed back to the caller of a deferred request
pub type CompletionReceiver = oneshot::Receiver<DispatchResult>;

/// A deferred request and the channel that resolves it
pub struct QueueEntry {
    descriptor: RequestDescriptor,
    completion: oneshot::Sender<DispatchResult>,
}

impl QueueEntry {
    /// Entry for `descriptor` plus the receiver its result arrives on
    pub fn new(descriptor: RequestDescriptor) -> (Self, CompletionReceiver) {
        let (completion, receiver) = oneshot::channel();
        (Self { descriptor, completion }, receiver)
    }

    /// The deferred request
    pub fn descriptor(&self) -> &RequestDescriptor {
        &self.descriptor
    }

    /// Resolve the entry, consuming it.
    pub fn resolve(self, result: DispatchResult) {
        if self.completion.send(result).is_err() {
            debug!(url = self.descriptor.url(), "caller went away before completion");
        }
    }
}

/// Result of [`RetryQueue::drain_and_replay`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every entry was replayed and resolved
    Replayed(usize),
    /// A replay was answered with 401 despite the fresh credential. That entry
    /// was resolved with `SessionExpired`; later entries are still queued.
    CredentialRejected { replayed: usize },
}

/// FIFO of deferred requests
#[derive(Default)]
pub struct RetryQueue {
    entries: Mutex<VecDeque<QueueEntry>>,
}

impl RetryQueue {
    /// Empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a descriptor and return the receiver its result arrives on.
    pub fn enqueue(&self, descriptor: RequestDescriptor) -> CompletionReceiver {
        let (entry, receiver) = QueueEntry::new(descriptor);
        self.push(entry);
        receiver
    }

    /// Append an entry built elsewhere
    pub fn push(&self, entry: QueueEntry) {
        let mut entries = self.entries.lock();
        entries.push_back(entry);
        debug!(queued = entries.len(), "request deferred until renewal completes");
    }

    /// Entries still waiting
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether nothing is waiting
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn pop_front(&self) -> Option<QueueEntry> {
        self.entries.lock().pop_front()
    }

    /// Replay entries in submission order with `credential`, resolving each
    /// with its classified result.
    ///
    /// Entries pushed while the drain is running are picked up by it.
    pub async fn drain_and_replay(
        &self,
        client: &TransportClient,
        credential: &Credential,
    ) -> DrainOutcome {
        let mut replayed = 0;

        while let Some(entry) = self.pop_front() {
            let classification = client.send(entry.descriptor(), Some(credential)).await;
            replayed += 1;

            if classification.is_credential_expired() {
                entry.resolve(Err(DispatchError::SessionExpired));
                return DrainOutcome::CredentialRejected { replayed };
            }

            entry.resolve(classification.into_result());
        }

        DrainOutcome::Replayed(replayed)
    }

    /// Resolve every entry with `error` without issuing any exchange.
    ///
    /// Returns the number of entries failed.
    pub fn drain_and_fail(&self, error: &DispatchError) -> usize {
        let drained: Vec<QueueEntry> = self.entries.lock().drain(..).collect();
        let count = drained.len();

        for entry in drained {
            entry.resolve(Err(error.clone()));
        }

        count
    }
}
