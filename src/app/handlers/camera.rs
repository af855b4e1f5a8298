// SPDX-License-Identifier: GPL-3.0-only

//! Session and stream control
//!
//! Handles open/close, facing and mode changes, and acquisition results.

use crate::app::CaptureController;
use crate::app::state::{CameraMode, Message, Session};
use crate::backends::camera::types::{BackendResult, Facing, StreamHandle};
use crate::backends::camera::AcquireOutcome;
use crate::errors::{CaptureError, CaptureResult};
use tracing::{debug, info, warn};

impl CaptureController {
    // =========================================================================
    // Session Lifecycle
    // =========================================================================

    /// Open the session and start acquiring a stream
    ///
    /// Opening an open session only applies `initial_mode`.
    pub fn open(&mut self, initial_mode: Option<CameraMode>) -> CaptureResult<()> {
        if self.session.is_open {
            debug!(session = %self.session.id, "Session already open");
            return match initial_mode {
                Some(mode) => self.set_mode(mode),
                None => Ok(()),
            };
        }

        let mode = initial_mode.unwrap_or(self.session.mode);
        self.session = Session::closed(mode, self.session.facing);
        self.session.is_open = true;
        info!(
            session = %self.session.id,
            mode = %mode,
            facing = %self.session.facing,
            "Capture session opened"
        );

        self.request_stream();
        Ok(())
    }

    /// Close the session from any state
    ///
    /// Aborts a running recording, drops the pending artifact, releases the
    /// stream and makes any in-flight acquisition stale. Safe to call repeatedly.
    pub fn close(&mut self) {
        let was_open = self.session.is_open;

        self.session.recorder.abort();
        self.session.pending_artifact = None;
        self.session.last_error = None;
        self.session.is_open = false;
        self.streams.invalidate();

        // Results delivered before the epoch moved on are released now
        let arrived = self
            .take_queued_messages(|message| matches!(message, Message::StreamAcquired { .. }));
        for message in arrived {
            if let Message::StreamAcquired { epoch, result } = message {
                self.handle_stream_acquired(epoch, result);
            }
        }

        if was_open {
            info!(session = %self.session.id, "Capture session closed");
        }
    }

    // =========================================================================
    // Camera Control
    // =========================================================================

    /// Switch between front and back camera
    pub fn toggle_facing(&mut self) -> CaptureResult<()> {
        self.set_facing(self.session.facing.toggled())
    }

    /// Change the requested camera; reacquires when the value changes
    pub fn set_facing(&mut self, facing: Facing) -> CaptureResult<()> {
        self.ensure_open()?;
        if self.session.facing == facing {
            debug!(facing = %facing, "Facing unchanged");
            return Ok(());
        }

        self.abort_recording_for_reacquire();
        info!(from = %self.session.facing, to = %facing, "Switching camera");
        self.session.facing = facing;
        self.request_stream();
        Ok(())
    }

    /// Change the capture mode; reacquires when the value changes
    pub fn set_mode(&mut self, mode: CameraMode) -> CaptureResult<()> {
        self.ensure_open()?;
        if self.session.mode == mode {
            debug!(mode = %mode, "Mode unchanged");
            return Ok(());
        }

        self.abort_recording_for_reacquire();
        info!(from = %self.session.mode, to = %mode, "Switching mode");
        self.session.mode = mode;
        self.request_stream();
        Ok(())
    }

    fn abort_recording_for_reacquire(&mut self) {
        if self.session.recorder.is_recording() {
            warn!("Camera change during recording, discarding the recording");
            self.session.recorder.abort();
        }
    }

    // =========================================================================
    // Backend Events
    // =========================================================================

    /// Install or discard the result of a stream request, then issue the
    /// queued follow-up if there is one
    ///
    /// Device failures are recorded on the session, never returned.
    pub(crate) fn handle_stream_acquired(
        &mut self,
        epoch: u64,
        result: BackendResult<StreamHandle>,
    ) {
        match self.streams.complete_acquire(epoch, result) {
            AcquireOutcome::Installed(stream) => {
                info!(session = %self.session.id, stream = %stream, "Preview bound to stream");
                self.session.last_error = None;
            }
            AcquireOutcome::Stale => {
                debug!(epoch, "Discarded stale acquisition");
            }
            AcquireOutcome::Failed(e) => {
                let error: CaptureError = e.into();
                warn!(session = %self.session.id, error = %error, "No preview available");
                self.session.last_error = Some(error);
            }
        }
        self.request_queued_stream();
    }
}
