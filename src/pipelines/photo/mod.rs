// SPDX-License-Identifier: MPL-2.0

//! Still capture pipeline
//!
//! ```text
//! StreamHandle → grab frame → normalize → JPEG → PendingArtifact
//! ```
//!
//! Capture is synchronous: the frame is sampled, normalized and encoded before
//! the call returns. The stream keeps running.

pub mod encoding;
pub mod processing;

pub use encoding::{EncodedImage, EncodingQuality, PhotoEncoder};
pub use processing::{ProcessedImage, StillProcessor};

use crate::app::state::PendingArtifact;
use crate::backends::camera::types::StreamHandle;
use crate::config::{Config, FileNaming};
use crate::errors::{CaptureError, CaptureResult};
use tracing::{debug, info};

/// Grabs, normalizes and encodes stills
#[derive(Debug, Clone, Copy)]
pub struct StillCapture {
    processor: StillProcessor,
    encoder: PhotoEncoder,
}

impl StillCapture {
    pub fn new(width: u32, height: u32, quality: EncodingQuality) -> Self {
        Self {
            processor: StillProcessor::new(width, height),
            encoder: PhotoEncoder::new(quality),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.still_width, config.still_height, config.jpeg_quality)
    }

    /// Output raster size
    pub fn dimensions(&self) -> (u32, u32) {
        self.processor.dimensions()
    }

    /// Sample the current frame of `handle` into a pending image
    pub fn capture(
        &self,
        handle: &mut StreamHandle,
        naming: FileNaming,
    ) -> CaptureResult<PendingArtifact> {
        if !handle.is_valid() {
            return Err(CaptureError::NoActiveStream);
        }

        let frame = handle.grab_frame()?;
        debug!(
            stream = %handle.id(),
            width = frame.width,
            height = frame.height,
            format = ?frame.format,
            "Frame grabbed for still"
        );

        let processed = self.processor.process(&frame)?;
        let encoded = self.encoder.encode(processed)?;

        info!(
            stream = %handle.id(),
            size = encoded.data.len(),
            width = encoded.width,
            height = encoded.height,
            "Still captured"
        );
        Ok(PendingArtifact::image(encoded, naming))
    }
}

impl Default for StillCapture {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::ArtifactKind;
    use crate::backends::camera::MediaBackend;
    use crate::backends::camera::types::{Facing, StreamConstraints};
    use crate::backends::virtual_camera::VirtualCameraBackend;
    use crate::constants::{IMAGE_MIME_TYPE, PHOTO_FILE_NAME};

    async fn open_stream(backend: &VirtualCameraBackend) -> StreamHandle {
        let constraints = StreamConstraints::new(Facing::Front, false);
        let stream = backend.request_stream(constraints).await.expect("stream");
        StreamHandle::new(constraints, stream)
    }

    #[tokio::test]
    async fn test_capture_produces_fixed_size_jpeg() {
        let backend = VirtualCameraBackend::new();
        let mut handle = open_stream(&backend).await;

        let artifact = StillCapture::default()
            .capture(&mut handle, FileNaming::Fixed)
            .expect("capture");

        assert_eq!(artifact.kind, ArtifactKind::Image);
        assert_eq!(artifact.mime_type, IMAGE_MIME_TYPE);
        assert_eq!(artifact.suggested_file_name, PHOTO_FILE_NAME);
        assert_eq!(artifact.dimensions, Some((640, 480)));
        let decoded = image::load_from_memory(&artifact.payload).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (640, 480));
        assert!(handle.is_valid());
    }

    #[tokio::test]
    async fn test_released_handle_is_rejected() {
        let backend = VirtualCameraBackend::new();
        let mut handle = open_stream(&backend).await;
        handle.release();

        let result = StillCapture::default().capture(&mut handle, FileNaming::Fixed);
        assert!(matches!(result, Err(CaptureError::NoActiveStream)));
    }
}
