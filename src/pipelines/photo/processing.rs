// SPDX-License-Identifier: GPL-3.0-only

//! Still frame normalization
//!
//! Converts whatever pixel layout the backend delivers into a tightly packed
//! RGB raster of fixed size. The source is stretched to the target, the same
//! way drawing a video element into a fixed canvas does; aspect ratio is not
//! preserved.

use crate::backends::camera::types::{CameraFrame, PixelFormat};
use crate::errors::{CaptureError, CaptureResult};
use image::{DynamicImage, RgbImage, RgbaImage, imageops};
use tracing::debug;

/// Processed image data
pub struct ProcessedImage {
    pub image: RgbImage,
    pub width: u32,
    pub height: u32,
}

/// Normalizes captured frames to the still raster
#[derive(Debug, Clone, Copy)]
pub struct StillProcessor {
    width: u32,
    height: u32,
}

impl StillProcessor {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn process(&self, frame: &CameraFrame) -> CaptureResult<ProcessedImage> {
        let rgba = frame_to_rgba(frame)?;

        let rgba = if rgba.dimensions() == (self.width, self.height) {
            rgba
        } else {
            debug!(
                from_width = frame.width,
                from_height = frame.height,
                to_width = self.width,
                to_height = self.height,
                "Stretching frame to still raster"
            );
            imageops::resize(&rgba, self.width, self.height, imageops::FilterType::Triangle)
        };

        let image = DynamicImage::ImageRgba8(rgba).to_rgb8();
        Ok(ProcessedImage {
            width: image.width(),
            height: image.height(),
            image,
        })
    }
}

/// Repack a frame into an RGBA image, honouring the row stride
pub fn frame_to_rgba(frame: &CameraFrame) -> CaptureResult<RgbaImage> {
    let bpp = frame.format.bytes_per_pixel() as usize;
    let width = frame.width as usize;
    let height = frame.height as usize;
    let stride = frame.stride as usize;
    let row_bytes = width * bpp;

    if width == 0 || height == 0 {
        return Err(CaptureError::Encoding("frame is empty".to_string()));
    }
    if stride < row_bytes || frame.data.len() < stride * (height - 1) + row_bytes {
        return Err(CaptureError::Encoding(format!(
            "frame buffer too small: {} bytes for {}x{} {:?} (stride {})",
            frame.data.len(),
            frame.width,
            frame.height,
            frame.format,
            frame.stride
        )));
    }

    let mut out = Vec::with_capacity(width * height * 4);
    for row in frame.data.chunks(stride).take(height) {
        for px in row[..row_bytes].chunks_exact(bpp) {
            match frame.format {
                PixelFormat::RGBA => out.extend_from_slice(px),
                PixelFormat::BGRA => out.extend_from_slice(&[px[2], px[1], px[0], px[3]]),
                PixelFormat::RGB24 => out.extend_from_slice(&[px[0], px[1], px[2], 255]),
                PixelFormat::Gray8 => out.extend_from_slice(&[px[0], px[0], px[0], 255]),
            }
        }
    }

    RgbaImage::from_raw(frame.width, frame.height, out)
        .ok_or_else(|| CaptureError::Encoding("frame repack size mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stretches_to_fixed_raster() {
        let frame = CameraFrame::packed(1280, 720, PixelFormat::RGBA, vec![128; 1280 * 720 * 4]);
        let processed = StillProcessor::new(640, 480).process(&frame).expect("process");
        assert_eq!((processed.width, processed.height), (640, 480));
        assert_eq!(processed.image.as_raw().len(), 640 * 480 * 3);
    }

    #[test]
    fn test_bgra_is_swizzled() {
        let frame = CameraFrame::packed(1, 1, PixelFormat::BGRA, vec![10, 20, 30, 255]);
        let rgba = frame_to_rgba(&frame).expect("convert");
        assert_eq!(rgba.as_raw(), &vec![30, 20, 10, 255]);
    }

    #[test]
    fn test_stride_padding_is_skipped() {
        // 2x2 RGB24 with 2 bytes of padding per row
        let mut frame = CameraFrame::packed(
            2,
            2,
            PixelFormat::RGB24,
            vec![1, 1, 1, 2, 2, 2, 0, 0, 3, 3, 3, 4, 4, 4, 0, 0],
        );
        frame.stride = 8;
        let rgba = frame_to_rgba(&frame).expect("convert");
        assert_eq!(
            rgba.as_raw(),
            &vec![1, 1, 1, 255, 2, 2, 2, 255, 3, 3, 3, 255, 4, 4, 4, 255]
        );
    }

    #[test]
    fn test_short_buffer_is_an_encoding_error() {
        let frame = CameraFrame::packed(4, 4, PixelFormat::RGBA, vec![0; 10]);
        assert!(matches!(
            frame_to_rgba(&frame),
            Err(CaptureError::Encoding(_))
        ));
    }
}
