//! Local still-image source.
//!
//! `FileSource` stands in for a camera: every capture yields the configured
//! local file. It is used by the demo binary and tests.
//!
//! The file source MUST NOT:
//! - Fetch remote URLs
//! - Copy or retain the image beyond handing out its path

use anyhow::{anyhow, Result};
use std::path::PathBuf;

use super::{CaptureError, CaptureEvent, CaptureSource};

/// Configuration for a local file source.
#[derive(Clone, Debug, Default)]
pub struct FileConfig {
    /// Local file path (e.g., "/sdcard/DCIM/capture.jpg").
    pub path: String,
}

/// Local file capture source.
pub struct FileSource {
    config: FileConfig,
    captures: u64,
    failures: u64,
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file capture only supports local paths (no URL schemes)"
            ));
        }
        log::info!("FileSource: capturing from {}", config.path);
        Ok(Self {
            config,
            captures: 0,
            failures: 0,
        })
    }

    /// Get capture statistics.
    pub fn stats(&self) -> FileStats {
        FileStats {
            captures: self.captures,
            failures: self.failures,
            path: self.config.path.clone(),
        }
    }
}

impl CaptureSource for FileSource {
    fn capture(&mut self) -> CaptureEvent {
        let path = PathBuf::from(&self.config.path);
        if !path.is_file() {
            self.failures += 1;
            log::warn!("FileSource: {} is not a readable file", path.display());
            return Err(CaptureError::new(format!(
                "no image at {}",
                path.display()
            )));
        }
        self.captures += 1;
        Ok(path)
    }
}

/// Statistics for a file source.
#[derive(Clone, Debug)]
pub struct FileStats {
    pub captures: u64,
    pub failures: u64,
    pub path: String,
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    !path.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_url_schemes_and_empty_paths() {
        assert!(FileSource::new(FileConfig {
            path: "https://example.com/cat.jpg".into()
        })
        .is_err());
        assert!(FileSource::new(FileConfig { path: "  ".into() }).is_err());
    }

    #[test]
    fn missing_file_is_a_capture_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.png");
        let mut source = FileSource::new(FileConfig {
            path: path.display().to_string(),
        })
        .unwrap();
        assert!(source.capture().is_err());
        assert_eq!(source.stats().failures, 1);
    }

    #[test]
    fn existing_file_is_captured() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut source = FileSource::new(FileConfig {
            path: file.path().display().to_string(),
        })
        .unwrap();
        assert_eq!(source.capture().unwrap(), file.path());
        assert_eq!(source.stats().captures, 1);
    }
}
