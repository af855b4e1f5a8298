// SPDX-License-Identifier: GPL-3.0-only

//! Review/confirm gate
//!
//! A pending artifact suspends the live preview until it is confirmed
//! (delivered once, then the session closes) or discarded by a retake.

use crate::app::CaptureController;
use crate::app::state::PendingArtifact;
use crate::errors::{CaptureError, CaptureResult};
use crate::storage;
use std::path::{Path, PathBuf};
use tracing::{error, info};

impl CaptureController {
    /// Hold `artifact` for review
    pub(crate) fn show(&mut self, artifact: PendingArtifact) {
        info!(
            session = %self.session.id,
            kind = ?artifact.kind,
            size = artifact.size(),
            name = %artifact.suggested_file_name,
            "Reviewing capture"
        );
        self.session.pending_artifact = Some(artifact);
    }

    /// Deliver the pending artifact to the sink and close the session
    ///
    /// The artifact leaves the session before delivery, so a repeated confirm
    /// finds nothing. If the sink fails the artifact is restored.
    pub fn confirm(&mut self) -> CaptureResult<()> {
        let artifact = self
            .session
            .pending_artifact
            .take()
            .ok_or(CaptureError::NothingToConfirm)?;

        let file = artifact.to_file();
        if let Err(e) = self.sink.artifact_ready(file) {
            error!(error = %e, name = %artifact.suggested_file_name, "Artifact delivery failed");
            self.session.pending_artifact = Some(artifact);
            return Err(e);
        }

        info!(
            session = %self.session.id,
            name = %artifact.suggested_file_name,
            mime_type = %artifact.mime_type,
            size = artifact.size(),
            "Artifact confirmed"
        );
        self.close();
        Ok(())
    }

    /// Discard the pending artifact and go back to the live preview
    ///
    /// Recording data is cleared before the new acquisition is issued.
    pub fn retake(&mut self) -> CaptureResult<()> {
        self.ensure_open()?;

        if let Some(artifact) = self.session.pending_artifact.take() {
            info!(kind = ?artifact.kind, size = artifact.size(), "Discarding capture");
        }
        self.session.recorder.abort();
        self.request_stream();
        Ok(())
    }

    /// Write the pending artifact's bytes to `dir`
    ///
    /// Does not change the session.
    pub fn save_locally(&self, dir: &Path) -> CaptureResult<PathBuf> {
        let artifact = self
            .session
            .pending_artifact
            .as_ref()
            .ok_or(CaptureError::NothingToConfirm)?;
        storage::save_bytes(dir, &artifact.suggested_file_name, &artifact.payload)
    }

    /// [`save_locally`](Self::save_locally) into the configured folder
    pub fn save_to_default_directory(&self) -> CaptureResult<PathBuf> {
        self.save_locally(&self.config.save_directory())
    }
}
