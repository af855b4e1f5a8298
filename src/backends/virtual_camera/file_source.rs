// SPDX-License-Identifier: GPL-3.0-only

//! Frame sources for the virtual camera
//!
//! Frames come either from an image file loaded once, or from a generated
//! colour-bar pattern that moves with every frame so consecutive grabs differ.

use crate::backends::camera::types::{BackendError, BackendResult, CameraFrame, Facing, PixelFormat};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Where the virtual camera gets its pixels
#[derive(Debug, Clone)]
pub enum FrameSource {
    /// Generated colour bars
    TestPattern { width: u32, height: u32 },
    /// A fixed image, repeated for every frame
    Still(Arc<CameraFrame>),
}

impl FrameSource {
    /// Produce frame number `sequence` as seen by a camera facing `facing`
    pub fn render(&self, facing: Facing, sequence: u64) -> CameraFrame {
        match self {
            FrameSource::TestPattern { width, height } => {
                render_test_pattern(*width, *height, facing, sequence)
            }
            FrameSource::Still(frame) => CameraFrame {
                captured_at: Instant::now(),
                ..CameraFrame::clone(frame)
            },
        }
    }
}

/// Load an image file as an RGBA camera frame
pub fn load_image_as_frame(path: &Path) -> BackendResult<CameraFrame> {
    info!(path = %path.display(), "Loading image file");

    let img = image::open(path).map_err(|e| {
        BackendError::Other(format!("Failed to load image '{}': {}", path.display(), e))
    })?;

    let rgba = img.to_rgba8();
    let width = rgba.width();
    let height = rgba.height();

    info!(width, height, "Image loaded successfully");

    Ok(CameraFrame::packed(
        width,
        height,
        PixelFormat::RGBA,
        rgba.into_raw(),
    ))
}

/// Standard colour bars, white to blue
const BARS: [[u8; 3]; 7] = [
    [235, 235, 235],
    [235, 235, 16],
    [16, 235, 235],
    [16, 235, 16],
    [235, 16, 235],
    [235, 16, 16],
    [16, 16, 235],
];

/// Generate an RGBA colour-bar frame
///
/// The bars scroll one column per frame. The back camera renders the bars in
/// reverse order so the two devices are distinguishable in captures.
pub fn render_test_pattern(width: u32, height: u32, facing: Facing, sequence: u64) -> CameraFrame {
    let width = width.max(1);
    let height = height.max(1);
    let bar_width = (width as u64).div_ceil(BARS.len() as u64).max(1);
    let shift = sequence % width as u64;

    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for _y in 0..height {
        for x in 0..width {
            let column = (x as u64 + shift) % width as u64;
            let mut bar = (column / bar_width) as usize % BARS.len();
            if facing == Facing::Back {
                bar = BARS.len() - 1 - bar;
            }
            let [r, g, b] = BARS[bar];
            data.extend_from_slice(&[r, g, b, 255]);
        }
    }

    CameraFrame::packed(width, height, PixelFormat::RGBA, data)
}
