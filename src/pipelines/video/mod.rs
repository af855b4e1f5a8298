// SPDX-License-Identifier: MPL-2.0

//! Clip recording
//!
//! The backend's encoder produces the container bytes; this module only keeps
//! its chunks in arrival order and joins them when the recording stops. No
//! re-encoding happens here.

pub mod recorder;

pub use recorder::{ClipRecorder, RecordedClip, RecordingId, RecordingState};
