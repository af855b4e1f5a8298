// SPDX-License-Identifier: MPL-2.0

//! Capture pipelines for stills and clips
//!
//! Both pipelines run against the session's single [`StreamHandle`]; neither
//! acquires nor releases it.
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Camera Frame │ ──▶ │  Photo Pipeline   │ ──▶ │ PendingArtifact  │
//! │ (any layout) │     │  - repack to RGBA │     │  image/jpeg      │
//! │              │     │  - stretch 640x480│     │                  │
//! │              │     │  - JPEG encode    │     │                  │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//!
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────────┐
//! │ Encoder      │ ──▶ │  Clip Recorder    │ ──▶ │ PendingArtifact  │
//! │ chunks       │     │  - ordered append │     │  video/webm      │
//! │              │     │  - concatenate    │     │                  │
//! └──────────────┘     └───────────────────┘     └──────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`photo`]: Frame normalization and JPEG encoding
//! - [`video`]: Chunk accumulation for a single recording
//!
//! [`StreamHandle`]: crate::backends::camera::StreamHandle

pub mod photo;
pub mod video;
