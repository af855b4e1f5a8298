// SPDX-License-Identifier: GPL-3.0-only

//! Still image encoding
//!
//! Stills are always JPEG; the quality preset is the only knob.

use super::processing::ProcessedImage;
use crate::errors::{CaptureError, CaptureResult};
use image::RgbImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Encoding quality settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncodingQuality {
    /// Low quality (high compression)
    Low,
    /// Medium quality (balanced)
    Medium,
    /// High quality (low compression)
    #[default]
    High,
    /// Maximum quality (minimal compression)
    Maximum,
}

impl EncodingQuality {
    pub const ALL: [EncodingQuality; 4] = [
        EncodingQuality::Low,
        EncodingQuality::Medium,
        EncodingQuality::High,
        EncodingQuality::Maximum,
    ];

    /// Get JPEG quality value (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            EncodingQuality::Low => 60,
            EncodingQuality::Medium => 80,
            EncodingQuality::High => 92,
            EncodingQuality::Maximum => 98,
        }
    }
}

/// Encoded image data
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// JPEG encoder for stills
#[derive(Debug, Clone, Copy, Default)]
pub struct PhotoEncoder {
    quality: EncodingQuality,
}

impl PhotoEncoder {
    pub fn new(quality: EncodingQuality) -> Self {
        Self { quality }
    }

    pub fn quality(&self) -> EncodingQuality {
        self.quality
    }

    pub fn encode(&self, processed: ProcessedImage) -> CaptureResult<EncodedImage> {
        let data = encode_jpeg(&processed.image, self.quality)?;
        debug!(
            size = data.len(),
            width = processed.width,
            height = processed.height,
            "Encoding complete"
        );
        Ok(EncodedImage {
            data,
            width: processed.width,
            height: processed.height,
        })
    }
}

/// Encode image as JPEG
fn encode_jpeg(image: &RgbImage, quality: EncodingQuality) -> CaptureResult<Vec<u8>> {
    let mut buffer = Vec::new();
    let mut encoder =
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, quality.jpeg_quality());

    encoder
        .encode(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|e| CaptureError::Encoding(format!("JPEG encoding failed: {}", e)))?;

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpeg_quality_values() {
        assert_eq!(EncodingQuality::Low.jpeg_quality(), 60);
        assert_eq!(EncodingQuality::Medium.jpeg_quality(), 80);
        assert_eq!(EncodingQuality::High.jpeg_quality(), 92);
        assert_eq!(EncodingQuality::Maximum.jpeg_quality(), 98);
    }

    #[test]
    fn test_encodes_decodable_jpeg() {
        let image = RgbImage::from_pixel(64, 48, image::Rgb([200, 40, 40]));
        let encoded = PhotoEncoder::new(EncodingQuality::Medium)
            .encode(ProcessedImage {
                image,
                width: 64,
                height: 48,
            })
            .expect("encode");

        assert_eq!(&encoded.data[..2], &[0xFF, 0xD8]);
        let decoded = image::load_from_memory(&encoded.data).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (64, 48));
    }
}
