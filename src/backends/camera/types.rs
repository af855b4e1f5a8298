// SPDX-License-Identifier: GPL-3.0-only
// Shared types for camera backend abstraction

//! Shared types for camera backends

use super::LiveStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;

/// Which physical camera a stream request targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Facing {
    /// User-facing (selfie) camera
    #[default]
    Front,
    /// Environment-facing camera
    Back,
}

impl Facing {
    /// The other camera
    pub fn toggled(self) -> Self {
        match self {
            Facing::Front => Facing::Back,
            Facing::Back => Facing::Front,
        }
    }
}

impl std::fmt::Display for Facing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Facing::Front => write!(f, "front"),
            Facing::Back => write!(f, "back"),
        }
    }
}

/// Kind of a track inside a live stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Video,
    Audio,
}

/// Parameters of a stream request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamConstraints {
    /// Preferred camera facing
    pub facing: Facing,
    /// Request a microphone track alongside the camera
    pub audio: bool,
    /// Fail instead of falling back to another camera when no device matches `facing`
    pub exact_facing: bool,
}

impl StreamConstraints {
    pub fn new(facing: Facing, audio: bool) -> Self {
        Self {
            facing,
            audio,
            exact_facing: false,
        }
    }

    /// Tracks a stream satisfying these constraints carries
    pub fn tracks(&self) -> Vec<TrackKind> {
        if self.audio {
            vec![TrackKind::Video, TrackKind::Audio]
        } else {
            vec![TrackKind::Video]
        }
    }
}

impl std::fmt::Display for StreamConstraints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} camera", self.facing)?;
        if self.audio {
            write!(f, " + microphone")?;
        }
        Ok(())
    }
}

/// Represents a camera device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraDevice {
    pub name: String,
    /// Backend-specific device identifier
    pub path: String,
    /// Mounting direction, when the platform reports one
    pub facing: Option<Facing>,
}

/// Pixel format for camera frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// RGBA - 32-bit with alpha (4 bytes per pixel)
    RGBA,
    /// BGRA - 32-bit with alpha (B G R A byte order)
    BGRA,
    /// RGB24 - 24-bit RGB (3 bytes per pixel, no alpha)
    RGB24,
    /// Gray8 - 8-bit grayscale (single channel)
    Gray8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            Self::RGBA | Self::BGRA => 4,
            Self::RGB24 => 3,
            Self::Gray8 => 1,
        }
    }
}

/// A single frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    pub data: Arc<[u8]>,
    pub format: PixelFormat,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Wrap tightly packed pixel data
    pub fn packed(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * format.bytes_per_pixel(),
            data: Arc::from(data.into_boxed_slice()),
            format,
            captured_at: Instant::now(),
        }
    }
}

/// Receives encoded media chunks while a recording is active
///
/// Backends call [`ChunkSender::send`] from whatever thread their encoder runs on.
/// The controller decides where the chunk goes; a `false` return means nobody is
/// listening any more and the backend can stop producing.
#[derive(Clone)]
pub struct ChunkSender(Arc<dyn Fn(Vec<u8>) -> bool + Send + Sync>);

impl ChunkSender {
    pub fn new<F>(deliver: F) -> Self
    where
        F: Fn(Vec<u8>) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(deliver))
    }

    pub fn send(&self, chunk: Vec<u8>) -> bool {
        (self.0)(chunk)
    }
}

impl std::fmt::Debug for ChunkSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ChunkSender")
    }
}

/// Process-unique stream identifier, used in logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamId(u64);

impl StreamId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StreamId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for StreamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

/// Exclusive handle to a live camera (+ optional microphone) feed
///
/// The handle is the only way to reach the backend stream. It is not `Clone`;
/// releasing it stops every track, and dropping it releases it.
pub struct StreamHandle {
    id: StreamId,
    constraints: StreamConstraints,
    stream: Box<dyn LiveStream>,
    released: bool,
}

impl StreamHandle {
    pub fn new(constraints: StreamConstraints, stream: Box<dyn LiveStream>) -> Self {
        let handle = Self {
            id: StreamId::next(),
            constraints,
            stream,
            released: false,
        };
        debug!(stream = %handle.id, device = %handle.stream.label(), "Stream handle created");
        handle
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn constraints(&self) -> &StreamConstraints {
        &self.constraints
    }

    /// Human-readable device label
    pub fn label(&self) -> &str {
        self.stream.label()
    }

    pub fn tracks(&self) -> Vec<TrackKind> {
        self.stream.tracks()
    }

    /// Not released and still producing frames
    pub fn is_valid(&self) -> bool {
        !self.released && self.stream.is_live()
    }

    /// Stop every track. Safe to call repeatedly.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.stream.stop();
        debug!(stream = %self.id, "Stream handle released");
    }

    /// Sample the current video frame
    pub fn grab_frame(&mut self) -> BackendResult<CameraFrame> {
        if !self.is_valid() {
            return Err(BackendError::StreamEnded);
        }
        self.stream.grab_frame()
    }

    /// Start producing encoded chunks into `sink`
    pub fn begin_recording(&mut self, sink: ChunkSender) -> BackendResult<()> {
        if !self.is_valid() {
            return Err(BackendError::StreamEnded);
        }
        self.stream.begin_recording(sink)
    }

    /// Stop the encoder; every remaining chunk is sent before this returns
    pub fn end_recording(&mut self) -> BackendResult<()> {
        if self.released {
            return Err(BackendError::StreamEnded);
        }
        self.stream.end_recording()
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("id", &self.id)
            .field("device", &self.stream.label())
            .field("constraints", &self.constraints)
            .field("released", &self.released)
            .finish()
    }
}

/// Result type for backend operations
pub type BackendResult<T> = Result<T, BackendError>;

/// Error types for backend operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Camera or microphone access was refused
    PermissionDenied,
    /// No device matches the request
    DeviceNotFound(String),
    /// Device is in use elsewhere
    Busy,
    /// The stream was stopped or the device disappeared
    StreamEnded,
    /// Recording already in progress
    RecordingInProgress,
    /// No recording in progress
    NoRecordingInProgress,
    /// Other errors
    Other(String),
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::PermissionDenied => write!(f, "Permission denied"),
            BackendError::DeviceNotFound(msg) => write!(f, "Device not found: {}", msg),
            BackendError::Busy => write!(f, "Device busy"),
            BackendError::StreamEnded => write!(f, "Stream has ended"),
            BackendError::RecordingInProgress => write!(f, "Recording already in progress"),
            BackendError::NoRecordingInProgress => write!(f, "No recording in progress"),
            BackendError::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for BackendError {}
