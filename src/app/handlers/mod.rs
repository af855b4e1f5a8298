// SPDX-License-Identifier: GPL-3.0-only

//! Controller operations
//!
//! Operations are split by concern, each file adding an `impl CaptureController`
//! block:
//!
//! - `camera`: open/close, facing and mode changes, stream arrival
//! - `capture`: stills, recording start/stop, chunk intake
//! - `review`: confirm, retake, local save

pub mod camera;
pub mod capture;
pub mod review;
