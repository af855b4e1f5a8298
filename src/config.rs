// SPDX-License-Identifier: GPL-3.0-only

use crate::app::state::CameraMode;
use crate::backends::camera::types::Facing;
use crate::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_SAVE_FOLDER, STILL_CAPTURE_HEIGHT,
    STILL_CAPTURE_WIDTH,
};
use crate::errors::{CaptureError, CaptureResult};
use crate::pipelines::photo::EncodingQuality;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How artifacts are named when handed to the upload form
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum FileNaming {
    /// `captured_photo.jpg` / `captured_video.webm`
    #[default]
    Fixed,
    /// `IMG_20250101_120000.jpg` / `VID_20250101_120000.webm`
    Timestamped,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mode used when the host opens the session without one
    pub default_mode: CameraMode,
    /// Camera facing requested on open
    pub default_facing: Facing,
    /// Still raster width
    pub still_width: u32,
    /// Still raster height
    pub still_height: u32,
    /// JPEG quality preset for stills
    pub jpeg_quality: EncodingQuality,
    /// Naming policy for confirmed artifacts
    pub file_naming: FileNaming,
    /// Request a microphone track in video mode
    pub record_audio: bool,
    /// Target of the local save affordance (None = ~/Pictures/Camera)
    pub save_directory: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_mode: CameraMode::Photo,
            default_facing: Facing::Front,
            still_width: STILL_CAPTURE_WIDTH,
            still_height: STILL_CAPTURE_HEIGHT,
            jpeg_quality: EncodingQuality::default(),
            file_naming: FileNaming::default(),
            record_audio: true,
            save_directory: None,
        }
    }
}

impl Config {
    /// Location of the config file, if the platform has a config dir
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load the user config, falling back to defaults
    ///
    /// A missing file is normal on first run; a malformed one is logged and ignored.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            debug!("No config directory on this platform, using defaults");
            return Self::default();
        };

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded config");
                config
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
                Self::default()
            }
        }
    }

    /// Load and validate a config file
    pub fn load_from(path: &Path) -> CaptureResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save_to(&self, path: &Path) -> CaptureResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values the still pipeline cannot work with
    pub fn validate(&self) -> CaptureResult<()> {
        if self.still_width == 0 || self.still_height == 0 {
            return Err(CaptureError::Config(format!(
                "still raster must be non-empty, got {}x{}",
                self.still_width, self.still_height
            )));
        }
        Ok(())
    }

    /// Directory used by the local save affordance
    pub fn save_directory(&self) -> PathBuf {
        self.save_directory.clone().unwrap_or_else(|| {
            dirs::picture_dir()
                .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
                .join(DEFAULT_SAVE_FOLDER)
        })
    }
}
