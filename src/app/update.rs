// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! The `update()` function routes each message to its handler in
//! `handlers::camera`, `handlers::capture` or `handlers::review`.

use crate::app::CaptureController;
use crate::app::state::Message;
use crate::errors::CaptureResult;
use tracing::{debug, warn};

impl CaptureController {
    /// Process one message to completion
    ///
    /// Device errors are absorbed here: they are logged and kept in
    /// `Session::last_error`, and the session stays open without a preview.
    /// Misuse (wrong state, wrong mode) is returned to the caller.
    pub fn update(&mut self, message: Message) -> CaptureResult<()> {
        let result = match message {
            // ===== Host =====
            Message::Open(mode) => self.open(mode),
            Message::Close => {
                self.close();
                Ok(())
            }

            // ===== Camera Control =====
            Message::ToggleFacing => self.toggle_facing(),
            Message::SetFacing(facing) => self.set_facing(facing),
            Message::SetMode(mode) => self.set_mode(mode),

            // ===== Capture =====
            Message::CaptureStill => self.capture_still(),
            Message::StartRecording => self.start_recording().map(|_| ()),
            Message::StopRecording => self.stop_recording(),

            // ===== Review =====
            Message::Confirm => self.confirm(),
            Message::Retake => self.retake(),
            Message::SaveLocally(dir) => {
                let saved = match dir {
                    Some(dir) => self.save_locally(&dir),
                    None => self.save_to_default_directory(),
                };
                saved.map(|path| debug!(path = %path.display(), "Saved pending artifact"))
            }

            // ===== Backend Events =====
            Message::StreamAcquired { epoch, result } => {
                self.handle_stream_acquired(epoch, result);
                Ok(())
            }
            Message::ChunkAvailable { recording, data } => {
                self.handle_chunk_available(recording, data);
                Ok(())
            }
        };

        match result {
            Err(e) if e.is_device_error() => {
                warn!(error = %e, "Device error");
                self.session.last_error = Some(e);
                Ok(())
            }
            other => other,
        }
    }
}
