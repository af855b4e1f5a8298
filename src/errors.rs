// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture session controller

use crate::app::state::CameraMode;
use crate::backends::camera::types::BackendError;
use std::fmt;

/// Result type alias using CaptureError
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Main controller error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Camera or microphone could not be opened
    DeviceAccess(DeviceAccessError),
    /// A capture was attempted without a valid stream
    NoActiveStream,
    /// Stop was requested while nothing is recording
    NoActiveRecording,
    /// Still or clip assembly failed
    Encoding(String),
    /// A recording is already running
    RecordingInProgress,
    /// The operation is only available in another mode
    WrongMode { required: CameraMode },
    /// The session is not open
    SessionClosed,
    /// An artifact is waiting for confirm or retake
    ReviewPending,
    /// Confirm was called with no pending artifact
    NothingToConfirm,
    /// The artifact sink rejected the file
    Delivery(String),
    /// Storage/filesystem errors
    Storage(String),
    /// Configuration errors
    Config(String),
}

/// Device access failures, reported at the acquisition boundary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceAccessError {
    /// The user (or platform policy) refused camera/microphone access
    PermissionDenied,
    /// No device satisfies the requested constraints
    NotFound(String),
    /// The device is held by another process
    Busy,
    /// Any other backend failure
    Backend(String),
}

impl CaptureError {
    /// Device errors are recoverable: the session stays open without a preview
    pub fn is_device_error(&self) -> bool {
        matches!(self, CaptureError::DeviceAccess(_))
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::DeviceAccess(e) => write!(f, "Device access error: {}", e),
            CaptureError::NoActiveStream => write!(f, "No active camera stream"),
            CaptureError::NoActiveRecording => write!(f, "No recording in progress"),
            CaptureError::Encoding(msg) => write!(f, "Encoding failed: {}", msg),
            CaptureError::RecordingInProgress => write!(f, "Recording already in progress"),
            CaptureError::WrongMode { required } => {
                write!(f, "Operation requires {:?} mode", required)
            }
            CaptureError::SessionClosed => write!(f, "Capture session is closed"),
            CaptureError::ReviewPending => write!(f, "A captured artifact is awaiting review"),
            CaptureError::NothingToConfirm => write!(f, "No captured artifact to confirm"),
            CaptureError::Delivery(msg) => write!(f, "Delivery failed: {}", msg),
            CaptureError::Storage(msg) => write!(f, "Storage error: {}", msg),
            CaptureError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl fmt::Display for DeviceAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceAccessError::PermissionDenied => write!(f, "Permission denied"),
            DeviceAccessError::NotFound(msg) => write!(f, "No matching device: {}", msg),
            DeviceAccessError::Busy => write!(f, "Device is busy"),
            DeviceAccessError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for CaptureError {}
impl std::error::Error for DeviceAccessError {}

impl From<DeviceAccessError> for CaptureError {
    fn from(err: DeviceAccessError) -> Self {
        CaptureError::DeviceAccess(err)
    }
}

impl From<BackendError> for CaptureError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::PermissionDenied => DeviceAccessError::PermissionDenied.into(),
            BackendError::DeviceNotFound(msg) => DeviceAccessError::NotFound(msg).into(),
            BackendError::Busy => DeviceAccessError::Busy.into(),
            BackendError::StreamEnded => CaptureError::NoActiveStream,
            BackendError::RecordingInProgress => CaptureError::RecordingInProgress,
            BackendError::NoRecordingInProgress => CaptureError::NoActiveRecording,
            BackendError::Other(msg) => DeviceAccessError::Backend(msg).into(),
        }
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        CaptureError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        CaptureError::Config(err.to_string())
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(err: image::ImageError) -> Self {
        CaptureError::Encoding(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_errors_map_to_device_access() {
        let err: CaptureError = BackendError::PermissionDenied.into();
        assert_eq!(
            err,
            CaptureError::DeviceAccess(DeviceAccessError::PermissionDenied)
        );
        assert!(err.is_device_error());

        let err: CaptureError = BackendError::DeviceNotFound("back".into()).into();
        assert!(err.is_device_error());
    }

    #[test]
    fn test_stream_ended_is_not_a_device_error() {
        let err: CaptureError = BackendError::StreamEnded.into();
        assert_eq!(err, CaptureError::NoActiveStream);
        assert!(!err.is_device_error());
    }
}
