// SPDX-License-Identifier: MPL-2.0

//! Camera capture session controller
//!
//! Lets a host take a still or record a short clip from the device camera,
//! review the result, and either confirm it (the file is handed to the host)
//! or retake it. The controller guarantees that at most one camera stream is
//! open at a time and that nothing keeps running after the session closes.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: The capture session controller, its messages and handlers
//! - [`backends`]: Media backend traits, the device stream manager and the virtual camera
//! - [`pipelines`]: Still normalization/encoding and clip assembly
//! - [`config`]: User configuration handling
//! - [`storage`]: Saving captured files locally
//!
//! # Example
//!
//! ```no_run
//! use camera_capture::{CameraMode, CaptureController, Config, CapturedFile};
//! use camera_capture::backends::virtual_camera::VirtualCameraBackend;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), camera_capture::CaptureError> {
//! let backend = Arc::new(VirtualCameraBackend::new());
//! let mut controller = CaptureController::new(backend, Config::default(), |file: CapturedFile| {
//!     println!("got {} ({} bytes)", file.name, file.data.len());
//! })?;
//!
//! controller.open(Some(CameraMode::Photo))?;
//! controller.wait_for_stream().await?;
//! controller.capture_still()?;
//! controller.confirm()?;
//! # Ok(())
//! # }
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod errors;
pub mod pipelines;
pub mod storage;

// Re-export commonly used types
pub use app::{
    ArtifactKind, ArtifactSink, CameraMode, CaptureController, CapturedFile, Message,
    PendingArtifact, PreviewState,
};
pub use backends::camera::{Facing, MediaBackend, StreamHandle};
pub use config::{Config, FileNaming};
pub use errors::{CaptureError, CaptureResult, DeviceAccessError};
