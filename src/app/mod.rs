// SPDX-License-Identifier: MPL-2.0

//! Capture session controller
//!
//! The controller owns the session state, the device stream manager, the still
//! pipeline and the sink that receives confirmed artifacts.
//!
//! # Architecture
//!
//! - `state`: Session, PendingArtifact, PreviewState and the `Message` enum
//! - `sink`: The `ArtifactSink` the host implements
//! - `update`: Message dispatch
//! - `handlers`: Operation implementations, split by concern
//!
//! # Event model
//!
//! Every operation takes `&mut self` and runs to completion. The only
//! asynchronous step is stream acquisition: it runs on a spawned task and its
//! result comes back as [`Message::StreamAcquired`] through the controller's
//! event channel, as do recording chunks ([`Message::ChunkAvailable`]). The
//! host drives the channel with [`CaptureController::next_event`] or
//! [`CaptureController::process_pending`].

mod handlers;
pub mod sink;
pub mod state;
mod update;

pub use sink::ArtifactSink;
pub use state::{
    ArtifactKind, CameraMode, CapturedFile, Message, PendingArtifact, PreviewState, Session,
};

use crate::backends::camera::types::{BackendError, StreamConstraints, StreamHandle};
use crate::backends::camera::{AcquireTicket, DeviceStreamManager, MediaBackend};
use crate::config::Config;
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::StillCapture;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Drives one capture session at a time against a media backend
pub struct CaptureController {
    session: Session,
    config: Config,
    streams: DeviceStreamManager,
    still: StillCapture,
    sink: Box<dyn ArtifactSink>,
    events_tx: mpsc::UnboundedSender<Message>,
    events_rx: mpsc::UnboundedReceiver<Message>,
}

impl CaptureController {
    /// Build a controller for `backend`
    ///
    /// Fails with [`CaptureError::Config`] when `config` does not validate.
    pub fn new<S>(backend: Arc<dyn MediaBackend>, config: Config, sink: S) -> CaptureResult<Self>
    where
        S: ArtifactSink + 'static,
    {
        config.validate()?;
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Ok(Self {
            session: Session::closed(config.default_mode, config.default_facing),
            still: StillCapture::from_config(&config),
            streams: DeviceStreamManager::new(backend),
            sink: Box::new(sink),
            config,
            events_tx,
            events_rx,
        })
    }

    /// Sender for posting messages into the controller's queue
    pub fn event_sender(&self) -> mpsc::UnboundedSender<Message> {
        self.events_tx.clone()
    }

    /// Wait for the next queued message
    pub async fn next_event(&mut self) -> Option<Message> {
        self.events_rx.recv().await
    }

    /// Wait for one message and process it
    pub async fn process_next(&mut self) -> CaptureResult<()> {
        match self.events_rx.recv().await {
            Some(message) => self.update(message),
            None => Ok(()),
        }
    }

    /// Process every message already queued, without waiting
    ///
    /// Returns how many were processed. Failures are logged and do not stop
    /// the drain.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(message) = self.events_rx.try_recv() {
            processed += 1;
            if let Err(e) = self.update(message) {
                warn!(error = %e, "Queued message failed");
            }
        }
        processed
    }

    /// Process messages until the outstanding acquisition resolves
    ///
    /// Returns the device error if the acquisition failed.
    pub async fn wait_for_stream(&mut self) -> CaptureResult<()> {
        while self.streams.is_acquiring() {
            self.process_next().await?;
        }
        if self.streams.has_live_stream() {
            return Ok(());
        }
        Err(self
            .session
            .last_error
            .clone()
            .unwrap_or(CaptureError::NoActiveStream))
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &Arc<dyn MediaBackend> {
        self.streams.backend()
    }

    /// The stream the preview is bound to
    pub fn current_stream(&self) -> Option<&StreamHandle> {
        self.streams.current()
    }

    pub fn has_live_stream(&self) -> bool {
        self.streams.has_live_stream()
    }

    pub fn is_acquiring(&self) -> bool {
        self.streams.is_acquiring()
    }

    pub fn pending_artifact(&self) -> Option<&PendingArtifact> {
        self.session.pending_artifact.as_ref()
    }

    pub fn preview_state(&self) -> PreviewState {
        if !self.session.is_open {
            PreviewState::Closed
        } else if self.session.pending_artifact.is_some() {
            PreviewState::Review
        } else if self.streams.is_acquiring() {
            PreviewState::Acquiring
        } else if self.streams.has_live_stream() {
            PreviewState::Live
        } else {
            PreviewState::NoPreview
        }
    }

    /// Capture actions are available
    pub fn can_capture(&self) -> bool {
        self.session.is_open
            && self.session.pending_artifact.is_none()
            && self.streams.has_live_stream()
    }

    fn ensure_open(&self) -> CaptureResult<()> {
        if self.session.is_open {
            Ok(())
        } else {
            Err(CaptureError::SessionClosed)
        }
    }

    fn stream_constraints(&self) -> StreamConstraints {
        let audio = self.session.mode == CameraMode::Video && self.config.record_audio;
        StreamConstraints::new(self.session.facing, audio)
    }

    /// Release the current stream and request one for the session's facing/mode
    ///
    /// The result arrives as [`Message::StreamAcquired`]. While an earlier
    /// request is still with the backend this one waits as its follow-up.
    fn request_stream(&mut self) {
        match self.streams.begin_acquire(self.stream_constraints()) {
            Some(ticket) => self.spawn_request(ticket),
            None => debug!(epoch = self.streams.epoch(), "Stream request queued"),
        }
    }

    /// Issue the follow-up request once the backend is free
    fn request_queued_stream(&mut self) {
        if let Some(ticket) = self.streams.take_queued() {
            self.spawn_request(ticket);
        }
    }

    fn spawn_request(&mut self, ticket: AcquireTicket) {
        let epoch = ticket.epoch;
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(_) => {
                let error = BackendError::Other("stream requests need a tokio runtime".into());
                self.handle_stream_acquired(epoch, Err(error));
                return;
            }
        };

        let request = self.streams.request(&ticket);
        let shared_epoch = self.streams.shared_epoch();
        let events = self.events_tx.clone();
        runtime.spawn(async move {
            let result = request.await;
            shared_epoch.settle(epoch, result, |result| {
                // If the controller is gone the message comes back here and its
                // handle is released on drop
                if events
                    .send(Message::StreamAcquired { epoch, result })
                    .is_err()
                {
                    debug!(epoch, "Controller dropped before stream arrived");
                }
            });
        });
    }

    /// Take queued messages accepted by `wanted`; requeue the rest in order
    fn take_queued_messages(&mut self, wanted: fn(&Message) -> bool) -> Vec<Message> {
        let mut taken = Vec::new();
        let mut deferred = Vec::new();
        while let Ok(message) = self.events_rx.try_recv() {
            if wanted(&message) {
                taken.push(message);
            } else {
                deferred.push(message);
            }
        }

        if !deferred.is_empty() {
            debug!(count = deferred.len(), "Requeueing messages");
        }
        for message in deferred {
            if let Err(e) = self.events_tx.send(message) {
                warn!(error = %e, "Failed to requeue message");
            }
        }
        taken
    }
}

impl Drop for CaptureController {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CaptureController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureController")
            .field("session", &self.session)
            .field("streams", &self.streams)
            .field("still", &self.still)
            .finish()
    }
}
