// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  CaptureController  │
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ DeviceStreamManager │  ← release-before-acquire, epoch guard
//! └──────────┬──────────┘
//!            │
//!            ▼
//! ┌─────────────────────┐
//! │ MediaBackend trait  │  ← request_stream → LiveStream
//! └──────────┬──────────┘
//!            │
//!            ▼
//!     ┌──────────────┐
//!     │VirtualCamera │  ← software cameras (tests, CLI)
//!     └──────────────┘
//! ```

pub mod manager;
pub mod types;

pub use manager::{AcquireEpoch, AcquireOutcome, AcquireTicket, DeviceStreamManager};
pub use types::*;

use futures::future::BoxFuture;

/// Platform media subsystem
///
/// Implementations hand out live streams; they never keep a reference to a
/// stream once it has been returned, so ownership sits entirely with the
/// [`StreamHandle`] that wraps it.
pub trait MediaBackend: Send + Sync {
    /// Backend identifier for logging
    fn name(&self) -> &str;

    /// Enumerate available cameras
    fn enumerate_cameras(&self) -> Vec<CameraDevice>;

    /// Request a live stream
    ///
    /// Resolves once the user granted access and the device is producing frames.
    /// The future is `'static` so the controller can run it on a spawned task.
    fn request_stream(
        &self,
        constraints: StreamConstraints,
    ) -> BoxFuture<'static, BackendResult<Box<dyn LiveStream>>>;
}

/// A granted device grab
pub trait LiveStream: Send {
    /// Device label
    fn label(&self) -> &str;

    /// Tracks carried by this stream
    fn tracks(&self) -> Vec<TrackKind>;

    /// False once stopped or after the device went away
    fn is_live(&self) -> bool;

    /// Sample the current video frame
    fn grab_frame(&mut self) -> BackendResult<CameraFrame>;

    /// Start encoding the video (and audio) tracks into chunks
    ///
    /// Chunks must be sent in temporal order.
    fn begin_recording(&mut self, sink: ChunkSender) -> BackendResult<()>;

    /// Stop encoding
    ///
    /// Every chunk of the recording, including the final flush, must have been
    /// handed to the sink before this returns.
    fn end_recording(&mut self) -> BackendResult<()>;

    /// Stop every track and release the device
    fn stop(&mut self);
}
