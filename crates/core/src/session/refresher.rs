//! Proactive session renewal on a fixed interval
//!
//! Renewing ahead of expiry keeps requests from ever seeing a 401 in the
//! common case. The worker only asks the renewer for a cycle, so it shares
//! the single-flight guarantee with request-driven renewal.
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use nexium_core::dispatch::SingleFlightRenewer;
//! use nexium_core::session::SessionRefresher;
//!
//! # async fn example(renewer: SingleFlightRenewer) -> nexium_domain::Result<()> {
//! let mut refresher = SessionRefresher::new(renewer, Duration::from_secs(600));
//! refresher.start()?;
//!
//! // ... do work ...
//!
//! refresher.stop().await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use nexium_domain::{NexiumError, Result};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dispatch::SingleFlightRenewer;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Background task that renews the session every `interval`
pub struct SessionRefresher {
    renewer: SingleFlightRenewer,
    interval: Duration,
    task_handle: Option<JoinHandle<()>>,
    cancellation: CancellationToken,
}

impl SessionRefresher {
    /// Refresher driving `renewer` every `interval`. Call [`start`](Self::start) to run it.
    pub fn new(renewer: SingleFlightRenewer, interval: Duration) -> Self {
        Self { renewer, interval, task_handle: None, cancellation: CancellationToken::new() }
    }

    /// Spawn the refresh worker.
    ///
    /// # Errors
    /// `Internal` if already running or called outside a Tokio runtime,
    /// `InvalidInput` for a zero interval.
    pub fn start(&mut self) -> Result<()> {
        if self.task_handle.is_some() {
            return Err(NexiumError::Internal("Session refresher already running".to_string()));
        }
        if self.interval.is_zero() {
            return Err(NexiumError::InvalidInput(
                "refresh interval must be greater than zero".to_string(),
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| {
            NexiumError::Internal("Session refresher requires a Tokio runtime".to_string())
        })?;

        // A stopped refresher may be started again with a fresh token.
        if self.cancellation.is_cancelled() {
            self.cancellation = CancellationToken::new();
        }

        info!(interval_secs = self.interval.as_secs(), "Starting session refresher");

        let renewer = self.renewer.clone();
        let interval = self.interval;
        let cancel = self.cancellation.clone();
        self.task_handle = Some(runtime.spawn(refresh_worker(renewer, interval, cancel)));
        Ok(())
    }

    /// Cancel the worker and wait for it to finish.
    ///
    /// # Errors
    /// `Internal` on shutdown timeout or a failed join.
    pub async fn stop(&mut self) -> Result<()> {
        self.cancellation.cancel();

        if let Some(handle) = self.task_handle.take() {
            tokio::time::timeout(SHUTDOWN_TIMEOUT, handle)
                .await
                .map_err(|_| {
                    NexiumError::Internal("Session refresher shutdown timeout".to_string())
                })?
                .map_err(|e| NexiumError::Internal(format!("Task join failed: {e}")))?;
        }

        info!("Session refresher stopped");
        Ok(())
    }

    /// Whether the worker is started and not cancelled
    pub fn is_running(&self) -> bool {
        self.task_handle.is_some() && !self.cancellation.is_cancelled()
    }
}

impl Drop for SessionRefresher {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

async fn refresh_worker(renewer: SingleFlightRenewer, interval: Duration, cancel: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!("Session refresher worker shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                if !renewer.has_credential() {
                    debug!("No session to refresh; skipping tick");
                    continue;
                }
                if let Err(err) = renewer.renew_now().await {
                    warn!(error = %err, "Proactive session renewal failed");
                }
            }
        }
    }
}
