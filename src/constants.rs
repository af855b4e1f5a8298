// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Still captures are normalized to this raster regardless of source size
pub const STILL_CAPTURE_WIDTH: u32 = 640;
pub const STILL_CAPTURE_HEIGHT: u32 = 480;

/// MIME type of confirmed still images
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";
/// MIME type of confirmed clips
pub const CLIP_MIME_TYPE: &str = "video/webm";

pub const IMAGE_EXTENSION: &str = "jpg";
pub const CLIP_EXTENSION: &str = "webm";

/// File names handed to the upload form under `FileNaming::Fixed`
pub const PHOTO_FILE_NAME: &str = "captured_photo.jpg";
pub const CLIP_FILE_NAME: &str = "captured_video.webm";

/// Prefixes used under `FileNaming::Timestamped`
pub const PHOTO_FILE_PREFIX: &str = "IMG";
pub const CLIP_FILE_PREFIX: &str = "VID";

/// Default folder name for locally saved photos and videos
pub const DEFAULT_SAVE_FOLDER: &str = "Camera";

/// Directory name under the user config dir
pub const CONFIG_DIR_NAME: &str = "camera-capture";
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Virtual camera defaults
pub mod virtual_camera {
    use super::Duration;

    /// Test-pattern frame size (16:9, so stills exercise the stretch to 4:3)
    pub const FRAME_WIDTH: u32 = 1280;
    pub const FRAME_HEIGHT: u32 = 720;

    /// Timeslice between emitted chunks when timed recording is enabled
    pub const DEFAULT_CHUNK_INTERVAL: Duration = Duration::from_millis(250);

    /// EBML magic that opens every WebM/Matroska stream
    pub const WEBM_HEADER: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];
}

/// CLI timing
pub mod cli {
    use super::Duration;

    /// How long the CLI waits for a stream before giving up
    pub const STREAM_WAIT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Poll interval of the recording progress line
    pub const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);
}
