// SPDX-License-Identifier: GPL-3.0-only

//! Delivery of confirmed artifacts to the host

use crate::app::state::CapturedFile;
use crate::errors::CaptureResult;

/// Receives the file produced by a confirm
///
/// Called at most once per artifact. An error keeps the artifact pending so the
/// user can try again.
pub trait ArtifactSink: Send {
    fn artifact_ready(&mut self, file: CapturedFile) -> CaptureResult<()>;
}

impl<F> ArtifactSink for F
where
    F: FnMut(CapturedFile) + Send,
{
    fn artifact_ready(&mut self, file: CapturedFile) -> CaptureResult<()> {
        self(file);
        Ok(())
    }
}
