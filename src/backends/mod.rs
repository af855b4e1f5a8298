// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera and microphone access
//!
//! # Modules
//!
//! - [`camera`]: the media backend traits, stream handles and the device stream manager
//! - [`virtual_camera`]: software cameras for the CLI and tests

pub mod camera;
pub mod virtual_camera;
