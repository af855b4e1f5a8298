// SPDX-License-Identifier: MPL-2.0

//! Local storage for captured files
//!
//! Backs the download affordance of the review screen and the CLI. Existing
//! files are never overwritten; a numeric suffix is appended instead.

use crate::app::sink::ArtifactSink;
use crate::app::state::CapturedFile;
use crate::errors::{CaptureError, CaptureResult};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// First path in `dir` for `name` that does not exist yet
///
/// `photo.jpg`, then `photo_1.jpg`, `photo_2.jpg`, ...
pub fn unique_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    (1u32..)
        .map(|n| match &extension {
            Some(ext) => dir.join(format!("{}_{}.{}", stem, n, ext)),
            None => dir.join(format!("{}_{}", stem, n)),
        })
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// Write `data` into `dir` under `name`, creating the directory
pub fn save_bytes(dir: &Path, name: &str, data: &[u8]) -> CaptureResult<PathBuf> {
    if name.is_empty() || Path::new(name).file_name().is_none_or(|n| n != name) {
        return Err(CaptureError::Storage(format!("invalid file name '{}'", name)));
    }

    std::fs::create_dir_all(dir)?;
    let path = unique_path(dir, name);
    std::fs::write(&path, data)?;
    info!(path = %path.display(), size = data.len(), "File saved");
    Ok(path)
}

pub fn save_file(dir: &Path, file: &CapturedFile) -> CaptureResult<PathBuf> {
    save_bytes(dir, &file.name, &file.data)
}

/// Sink that writes every confirmed file into a directory
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
    saved: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            saved: Vec::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Paths written so far, oldest first
    pub fn saved(&self) -> &[PathBuf] {
        &self.saved
    }
}

impl ArtifactSink for DirectorySink {
    fn artifact_ready(&mut self, file: CapturedFile) -> CaptureResult<()> {
        debug!(name = %file.name, mime_type = %file.mime_type, "Storing confirmed file");
        let path = save_file(&self.dir, &file)?;
        self.saved.push(path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existing_names_get_a_suffix() {
        let dir = tempfile::tempdir().expect("tempdir");
        let first = save_bytes(dir.path(), "captured_photo.jpg", b"one").expect("first");
        let second = save_bytes(dir.path(), "captured_photo.jpg", b"two").expect("second");

        assert_eq!(first, dir.path().join("captured_photo.jpg"));
        assert_eq!(second, dir.path().join("captured_photo_1.jpg"));
        assert_eq!(std::fs::read(&first).expect("read"), b"one");
        assert_eq!(std::fs::read(&second).expect("read"), b"two");
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("Pictures").join("Camera");
        let path = save_bytes(&nested, "clip.webm", &[1, 2, 3]).expect("save");
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn test_rejects_path_like_names() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(matches!(
            save_bytes(dir.path(), "../escape.jpg", b"x"),
            Err(CaptureError::Storage(_))
        ));
        assert!(matches!(
            save_bytes(dir.path(), "", b"x"),
            Err(CaptureError::Storage(_))
        ));
    }

    #[test]
    fn test_directory_sink_records_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut sink = DirectorySink::new(dir.path());
        sink.artifact_ready(CapturedFile {
            name: "captured_video.webm".to_string(),
            mime_type: "video/webm".to_string(),
            data: vec![0; 45],
        })
        .expect("deliver");

        assert_eq!(sink.saved().len(), 1);
        assert_eq!(std::fs::metadata(&sink.saved()[0]).expect("meta").len(), 45);
    }
}
