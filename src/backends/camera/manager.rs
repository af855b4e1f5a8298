// SPDX-License-Identifier: GPL-3.0-only

//! Device stream lifecycle manager
//!
//! The manager provides:
//! - Exclusive ownership of the session's single [`StreamHandle`]
//! - Release-before-acquire ordering
//! - At most one backend request in flight; newer requests wait as a follow-up
//! - An epoch guard so acquisitions that resolve late are released, never installed

use super::MediaBackend;
use super::types::*;
use futures::FutureExt;
use futures::future::BoxFuture;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// An issued acquisition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquireTicket {
    /// Epoch the request belongs to
    pub epoch: u64,
    pub constraints: StreamConstraints,
}

/// What happened to an acquisition result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// The handle is now the current stream
    Installed(StreamId),
    /// The request was superseded or cancelled; any handle was released
    Stale,
    /// The current request failed
    Failed(BackendError),
}

/// Latest acquisition epoch, shared with the tasks awaiting backend requests
#[derive(Debug, Clone, Default)]
pub struct AcquireEpoch(Arc<Mutex<u64>>);

impl AcquireEpoch {
    fn lock(&self) -> MutexGuard<'_, u64> {
        self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> u64 {
        *self.lock()
    }

    fn advance(&self) -> u64 {
        let mut epoch = self.lock();
        *epoch += 1;
        *epoch
    }

    /// Hand a resolved request to `deliver`, releasing it first if it is stale
    ///
    /// The epoch stays locked while `deliver` runs, so a request is either
    /// delivered before the epoch moves on or released here.
    pub fn settle<F>(&self, epoch: u64, result: BackendResult<StreamHandle>, deliver: F)
    where
        F: FnOnce(BackendResult<StreamHandle>),
    {
        let current = self.lock();
        if *current == epoch {
            deliver(result);
            return;
        }

        if let Ok(mut handle) = result {
            info!(
                epoch,
                current_epoch = *current,
                stream = %handle.id(),
                "Releasing stream that resolved after being superseded"
            );
            handle.release();
        }
        deliver(Err(BackendError::StreamEnded));
    }
}

/// Owns the live stream on behalf of a capture session
pub struct DeviceStreamManager {
    backend: Arc<dyn MediaBackend>,
    current: Option<StreamHandle>,
    epoch: AcquireEpoch,
    /// Epoch of the request the backend is working on
    in_flight: Option<u64>,
    /// Latest constraints waiting for the in-flight request to resolve
    queued: Option<StreamConstraints>,
}

impl DeviceStreamManager {
    pub fn new(backend: Arc<dyn MediaBackend>) -> Self {
        info!(backend = %backend.name(), "Creating device stream manager");
        Self {
            backend,
            current: None,
            epoch: AcquireEpoch::default(),
            in_flight: None,
            queued: None,
        }
    }

    pub fn backend(&self) -> &Arc<dyn MediaBackend> {
        &self.backend
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.current()
    }

    /// Shared epoch for settling requests off the owning task
    pub fn shared_epoch(&self) -> AcquireEpoch {
        self.epoch.clone()
    }

    /// An acquisition for the latest epoch is outstanding
    pub fn is_acquiring(&self) -> bool {
        self.queued.is_some() || self.in_flight.is_some_and(|epoch| epoch == self.epoch())
    }

    /// The backend is still working on a request, current or superseded
    pub fn has_request_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn current(&self) -> Option<&StreamHandle> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut StreamHandle> {
        self.current.as_mut()
    }

    pub fn has_live_stream(&self) -> bool {
        self.current.as_ref().is_some_and(StreamHandle::is_valid)
    }

    /// Release the current stream and open a new epoch for `constraints`
    ///
    /// Returns the ticket to send to the backend, or `None` when a request is
    /// already in flight. The constraints are then kept as the follow-up and
    /// issued by [`Self::take_queued`] once that request resolves.
    pub fn begin_acquire(&mut self, constraints: StreamConstraints) -> Option<AcquireTicket> {
        self.release();
        let epoch = self.epoch.advance();

        if let Some(in_flight) = self.in_flight {
            info!(epoch, in_flight, request = %constraints, "Request in flight, queueing stream request");
            self.queued = Some(constraints);
            return None;
        }

        self.queued = None;
        self.in_flight = Some(epoch);
        info!(epoch, request = %constraints, "Acquiring stream");
        Some(AcquireTicket { epoch, constraints })
    }

    /// The queued follow-up, once nothing is in flight
    pub fn take_queued(&mut self) -> Option<AcquireTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        let constraints = self.queued.take()?;
        let epoch = self.epoch();
        self.in_flight = Some(epoch);
        info!(epoch, request = %constraints, "Acquiring queued stream request");
        Some(AcquireTicket { epoch, constraints })
    }

    /// The backend request for `ticket`, independent of `self`
    pub fn request(&self, ticket: &AcquireTicket) -> BoxFuture<'static, BackendResult<StreamHandle>> {
        let constraints = ticket.constraints;
        let request = self.backend.request_stream(constraints);
        async move {
            request
                .await
                .map(|stream| StreamHandle::new(constraints, stream))
        }
        .boxed()
    }

    /// Install or discard the result of a request
    pub fn complete_acquire(
        &mut self,
        epoch: u64,
        result: BackendResult<StreamHandle>,
    ) -> AcquireOutcome {
        if self.in_flight == Some(epoch) {
            self.in_flight = None;
        }

        let current_epoch = self.epoch();
        if epoch != current_epoch {
            match result {
                Ok(mut handle) => {
                    info!(
                        epoch,
                        current_epoch,
                        stream = %handle.id(),
                        "Releasing stream from stale request"
                    );
                    handle.release();
                }
                Err(e) => debug!(epoch, error = %e, "Ignoring result of stale request"),
            }
            return AcquireOutcome::Stale;
        }

        match result {
            Ok(handle) => {
                let id = handle.id();
                info!(epoch, stream = %id, device = %handle.label(), "Stream acquired");
                // begin_acquire released the previous one; keep the invariant even if
                // a caller bypassed it
                self.release();
                self.current = Some(handle);
                AcquireOutcome::Installed(id)
            }
            Err(e) => {
                warn!(epoch, error = %e, "Stream acquisition failed");
                AcquireOutcome::Failed(e)
            }
        }
    }

    /// Release, request and install in one step
    pub async fn acquire(
        &mut self,
        constraints: StreamConstraints,
    ) -> BackendResult<&mut StreamHandle> {
        let ticket = self.begin_acquire(constraints).ok_or(BackendError::Busy)?;
        let result = self.request(&ticket).await;
        match self.complete_acquire(ticket.epoch, result) {
            AcquireOutcome::Installed(_) => self.current.as_mut().ok_or(BackendError::StreamEnded),
            AcquireOutcome::Failed(e) => Err(e),
            AcquireOutcome::Stale => Err(BackendError::StreamEnded),
        }
    }

    /// Stop the current stream, if any. Idempotent.
    pub fn release(&mut self) {
        if let Some(mut handle) = self.current.take() {
            info!(stream = %handle.id(), "Releasing stream");
            handle.release();
        }
    }

    /// Release the stream, drop the follow-up and make every outstanding request stale
    pub fn invalidate(&mut self) {
        self.epoch.advance();
        self.queued = None;
        self.release();
    }
}

impl std::fmt::Debug for DeviceStreamManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceStreamManager")
            .field("backend", &self.backend.name())
            .field("epoch", &self.epoch())
            .field("in_flight", &self.in_flight)
            .field("queued", &self.queued)
            .field("current", &self.current)
            .finish()
    }
}
