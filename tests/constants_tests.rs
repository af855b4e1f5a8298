// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use camera_capture::constants::{self, virtual_camera};
use camera_capture::pipelines::photo::EncodingQuality;

#[test]
fn test_still_raster_is_4_by_3() {
    assert_eq!(constants::STILL_CAPTURE_WIDTH, 640);
    assert_eq!(constants::STILL_CAPTURE_HEIGHT, 480);
    assert_eq!(
        constants::STILL_CAPTURE_WIDTH * 3,
        constants::STILL_CAPTURE_HEIGHT * 4
    );
}

#[test]
fn test_file_names_match_mime_types() {
    assert!(constants::PHOTO_FILE_NAME.ends_with(constants::IMAGE_EXTENSION));
    assert!(constants::CLIP_FILE_NAME.ends_with(constants::CLIP_EXTENSION));
    assert_eq!(constants::IMAGE_MIME_TYPE, "image/jpeg");
    assert_eq!(constants::CLIP_MIME_TYPE, "video/webm");
}

#[test]
fn test_virtual_frames_differ_from_still_aspect() {
    // The stretch path only runs when source and target differ
    assert_ne!(
        virtual_camera::FRAME_WIDTH * constants::STILL_CAPTURE_HEIGHT,
        virtual_camera::FRAME_HEIGHT * constants::STILL_CAPTURE_WIDTH
    );
}

#[test]
fn test_quality_preset_ordering() {
    // Presets are ordered from lowest to highest quality
    let mut prev = 0u8;
    for preset in EncodingQuality::ALL {
        assert!(preset.jpeg_quality() > prev);
        assert!(preset.jpeg_quality() <= 100);
        prev = preset.jpeg_quality();
    }
}
