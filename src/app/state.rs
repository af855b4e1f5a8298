// SPDX-License-Identifier: GPL-3.0-only

//! Session state and controller messages

use crate::backends::camera::types::{BackendResult, Facing, StreamHandle};
use crate::config::FileNaming;
use crate::constants::{
    CLIP_EXTENSION, CLIP_FILE_NAME, CLIP_FILE_PREFIX, CLIP_MIME_TYPE, IMAGE_EXTENSION,
    IMAGE_MIME_TYPE, PHOTO_FILE_NAME, PHOTO_FILE_PREFIX,
};
use crate::errors::CaptureError;
use crate::pipelines::photo::EncodedImage;
use crate::pipelines::video::{ClipRecorder, RecordedClip, RecordingId, RecordingState};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;

/// Camera modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CameraMode {
    #[default]
    Photo,
    Video,
}

impl std::fmt::Display for CameraMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraMode::Photo => write!(f, "photo"),
            CameraMode::Video => write!(f, "video"),
        }
    }
}

/// What a pending artifact contains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Image,
    Clip,
}

impl ArtifactKind {
    pub fn mime_type(self) -> &'static str {
        match self {
            ArtifactKind::Image => IMAGE_MIME_TYPE,
            ArtifactKind::Clip => CLIP_MIME_TYPE,
        }
    }

    /// File name for an artifact of this kind created at `timestamp`
    pub fn file_name_at(self, naming: FileNaming, timestamp: DateTime<Local>) -> String {
        match (naming, self) {
            (FileNaming::Fixed, ArtifactKind::Image) => PHOTO_FILE_NAME.to_string(),
            (FileNaming::Fixed, ArtifactKind::Clip) => CLIP_FILE_NAME.to_string(),
            (FileNaming::Timestamped, kind) => {
                let (prefix, extension) = match kind {
                    ArtifactKind::Image => (PHOTO_FILE_PREFIX, IMAGE_EXTENSION),
                    ArtifactKind::Clip => (CLIP_FILE_PREFIX, CLIP_EXTENSION),
                };
                format!(
                    "{}_{}.{}",
                    prefix,
                    timestamp.format("%Y%m%d_%H%M%S"),
                    extension
                )
            }
        }
    }

    pub fn file_name(self, naming: FileNaming) -> String {
        self.file_name_at(naming, Local::now())
    }
}

/// A capture result awaiting confirm or retake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingArtifact {
    pub kind: ArtifactKind,
    pub payload: Vec<u8>,
    pub mime_type: String,
    pub suggested_file_name: String,
    /// Raster size of an image
    pub dimensions: Option<(u32, u32)>,
    /// Number of chunks a clip was assembled from
    pub chunk_count: Option<usize>,
    /// Wall-clock length of a clip's recording
    pub duration: Option<Duration>,
}

impl PendingArtifact {
    pub fn image(encoded: EncodedImage, naming: FileNaming) -> Self {
        Self {
            kind: ArtifactKind::Image,
            mime_type: ArtifactKind::Image.mime_type().to_string(),
            suggested_file_name: ArtifactKind::Image.file_name(naming),
            dimensions: Some((encoded.width, encoded.height)),
            chunk_count: None,
            duration: None,
            payload: encoded.data,
        }
    }

    pub fn clip(clip: RecordedClip, naming: FileNaming) -> Self {
        Self {
            kind: ArtifactKind::Clip,
            mime_type: ArtifactKind::Clip.mime_type().to_string(),
            suggested_file_name: ArtifactKind::Clip.file_name(naming),
            dimensions: None,
            chunk_count: Some(clip.chunk_count),
            duration: Some(clip.duration),
            payload: clip.data,
        }
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    /// Copy out the file handed to the host
    pub fn to_file(&self) -> CapturedFile {
        CapturedFile {
            name: self.suggested_file_name.clone(),
            mime_type: self.mime_type.clone(),
            data: self.payload.clone(),
        }
    }

    pub fn into_file(self) -> CapturedFile {
        CapturedFile {
            name: self.suggested_file_name,
            mime_type: self.mime_type,
            data: self.payload,
        }
    }
}

/// A named, typed, self-contained file delivered on confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFile {
    pub name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// What the preview area shows
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    /// Session is not open
    Closed,
    /// A stream request is in flight; nothing to show yet
    Acquiring,
    /// Bound to the live stream
    Live,
    /// No stream (device error); placeholder only
    NoPreview,
    /// Showing the pending artifact; live preview suspended
    Review,
}

/// One open-to-close lifetime of the controller
#[derive(Debug)]
pub struct Session {
    /// Changes on every open, for log correlation
    pub id: Uuid,
    pub is_open: bool,
    pub mode: CameraMode,
    pub facing: Facing,
    pub recorder: ClipRecorder,
    pub pending_artifact: Option<PendingArtifact>,
    /// Most recent device failure
    pub last_error: Option<CaptureError>,
}

impl Session {
    /// A closed session that will request `facing` when opened
    pub fn closed(mode: CameraMode, facing: Facing) -> Self {
        Self {
            id: Uuid::new_v4(),
            is_open: false,
            mode,
            facing,
            recorder: ClipRecorder::new(),
            pending_artifact: None,
            last_error: None,
        }
    }

    pub fn recording_state(&self) -> &RecordingState {
        self.recorder.state()
    }

    pub fn is_recording(&self) -> bool {
        self.recorder.is_recording()
    }

    pub fn is_reviewing(&self) -> bool {
        self.pending_artifact.is_some()
    }
}

/// Controller messages
///
/// Host actions and backend events are processed one at a time by
/// [`CaptureController::update`](crate::app::CaptureController::update).
#[derive(Debug)]
pub enum Message {
    // ===== Host =====
    /// Open the session, optionally in a given mode
    Open(Option<CameraMode>),
    /// Close the session and release the camera
    Close,

    // ===== Camera Control =====
    ToggleFacing,
    SetFacing(Facing),
    SetMode(CameraMode),

    // ===== Capture =====
    CaptureStill,
    StartRecording,
    StopRecording,

    // ===== Review =====
    Confirm,
    Retake,
    /// Write the pending artifact to a directory (None = configured folder)
    SaveLocally(Option<PathBuf>),

    // ===== Backend Events =====
    /// A stream request resolved
    StreamAcquired {
        epoch: u64,
        result: BackendResult<StreamHandle>,
    },
    /// The encoder produced a chunk for `recording`
    ChunkAvailable {
        recording: RecordingId,
        data: Vec<u8>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_names() {
        assert_eq!(
            ArtifactKind::Image.file_name(FileNaming::Fixed),
            "captured_photo.jpg"
        );
        assert_eq!(
            ArtifactKind::Clip.file_name(FileNaming::Fixed),
            "captured_video.webm"
        );
    }

    #[test]
    fn test_timestamped_names() {
        let at = Local
            .with_ymd_and_hms(2025, 3, 7, 9, 5, 1)
            .single()
            .expect("valid local time");
        assert_eq!(
            ArtifactKind::Image.file_name_at(FileNaming::Timestamped, at),
            "IMG_20250307_090501.jpg"
        );
        assert_eq!(
            ArtifactKind::Clip.file_name_at(FileNaming::Timestamped, at),
            "VID_20250307_090501.webm"
        );
    }

    #[test]
    fn test_clip_artifact_metadata() {
        let artifact = PendingArtifact::clip(
            RecordedClip {
                data: vec![0; 45],
                chunk_count: 3,
                duration: Duration::from_secs(2),
            },
            FileNaming::Fixed,
        );
        assert_eq!(artifact.kind, ArtifactKind::Clip);
        assert_eq!(artifact.mime_type, "video/webm");
        assert_eq!(artifact.size(), 45);
        assert_eq!(artifact.chunk_count, Some(3));

        let file = artifact.into_file();
        assert_eq!(file.name, "captured_video.webm");
        assert_eq!(file.data.len(), 45);
    }
}
