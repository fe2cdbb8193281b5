//! Capture flow boundary.
//!
//! A capture source produces exactly one event per request: the path of a
//! captured still, or the reason the capture failed. The only obligation on
//! this side is to decode that file into a `VisionImage` before any vision
//! client sees it.
//!
//! Sources MUST NOT:
//! - Fetch remote URLs
//! - Buffer or stream multiple frames

pub mod file;

pub use file::{FileConfig, FileSource, FileStats};

use anyhow::{anyhow, Result};
use std::fmt;
use std::path::PathBuf;

use crate::frame::VisionImage;

/// Why a capture produced no file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureError {
    pub message: String,
}

impl CaptureError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CaptureError {}

/// Outcome of one capture request.
pub type CaptureEvent = std::result::Result<PathBuf, CaptureError>;

pub trait CaptureSource {
    /// Take one still image.
    fn capture(&mut self) -> CaptureEvent;
}

/// Decode a capture into a bitmap. Failed captures and undecodable files are
/// rejected here.
pub fn decode_capture(event: CaptureEvent) -> Result<VisionImage> {
    let path = event.map_err(|e| anyhow!("capture failed: {}", e))?;
    VisionImage::open(&path)
}
