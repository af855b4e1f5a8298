// SPDX-License-Identifier: GPL-3.0-only

//! Capture operations handlers
//!
//! Handles still capture, the recording state machine and chunk intake.

use crate::app::CaptureController;
use crate::app::state::{CameraMode, Message, PendingArtifact};
use crate::backends::camera::types::ChunkSender;
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::video::RecordingId;
use tracing::{info, warn};

impl CaptureController {
    // =========================================================================
    // Still Capture
    // =========================================================================

    /// Sample the live stream into a pending image and enter review
    pub fn capture_still(&mut self) -> CaptureResult<()> {
        self.ensure_capture_allowed(CameraMode::Photo)?;

        let handle = self
            .streams
            .current_mut()
            .ok_or(CaptureError::NoActiveStream)?;
        let artifact = self.still.capture(handle, self.config.file_naming)?;
        self.show(artifact);
        Ok(())
    }

    // =========================================================================
    // Recording
    // =========================================================================

    /// Start recording the live stream
    ///
    /// Chunks produced by the backend arrive as [`Message::ChunkAvailable`].
    pub fn start_recording(&mut self) -> CaptureResult<RecordingId> {
        self.ensure_capture_allowed(CameraMode::Video)?;
        if self.session.recorder.is_recording() {
            return Err(CaptureError::RecordingInProgress);
        }

        let handle = self
            .streams
            .current_mut()
            .filter(|handle| handle.is_valid())
            .ok_or(CaptureError::NoActiveStream)?;

        let recording = self.session.recorder.start()?;
        let events = self.events_tx.clone();
        let sink = ChunkSender::new(move |data| {
            events
                .send(Message::ChunkAvailable { recording, data })
                .is_ok()
        });

        if let Err(e) = handle.begin_recording(sink) {
            warn!(recording = %recording, error = %e, "Backend refused to record");
            self.session.recorder.abort();
            return Err(e.into());
        }

        info!(
            session = %self.session.id,
            recording = %recording,
            stream = %handle.id(),
            "Recording live stream"
        );
        Ok(recording)
    }

    /// Append a chunk to the active recording
    pub fn append_chunk(&mut self, data: Vec<u8>) -> CaptureResult<()> {
        self.ensure_open()?;
        self.session.recorder.append_chunk(data)
    }

    /// Finish the recording and enter review with the clip
    ///
    /// The backend flushes its encoder first; every chunk it flushed is taken
    /// from the queue before the chunks are joined.
    pub fn stop_recording(&mut self) -> CaptureResult<()> {
        self.ensure_open()?;
        if !self.session.recorder.is_recording() {
            return Err(CaptureError::NoActiveRecording);
        }

        if let Some(handle) = self.streams.current_mut()
            && let Err(e) = handle.end_recording()
        {
            warn!(error = %e, "Encoder flush failed, keeping chunks received so far");
        }
        self.drain_chunks();

        let clip = self.session.recorder.finish()?;
        let artifact = PendingArtifact::clip(clip, self.config.file_naming);
        self.show(artifact);
        Ok(())
    }

    /// Chunk event from the backend
    pub(crate) fn handle_chunk_available(&mut self, recording: RecordingId, data: Vec<u8>) {
        self.session.recorder.append_for(recording, data);
    }

    /// Take queued chunks for the active recording; requeue everything else
    fn drain_chunks(&mut self) {
        let chunks =
            self.take_queued_messages(|message| matches!(message, Message::ChunkAvailable { .. }));
        for message in chunks {
            if let Message::ChunkAvailable { recording, data } = message {
                self.handle_chunk_available(recording, data);
            }
        }
    }

    fn ensure_capture_allowed(&self, required: CameraMode) -> CaptureResult<()> {
        self.ensure_open()?;
        if self.session.pending_artifact.is_some() {
            return Err(CaptureError::ReviewPending);
        }
        if self.session.mode != required {
            return Err(CaptureError::WrongMode { required });
        }
        Ok(())
    }
}
