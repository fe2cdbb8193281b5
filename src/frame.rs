//! Decoded bitmap handed to vision clients.
//!
//! - `VisionImage`: immutable RGBA pixels plus the rotation the toolkit should
//!   apply. Cloning shares the pixel buffer.
//!
//! Decoding happens here, before any adapter runs. A file that cannot be
//! decoded never reaches a vision client.

use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, RgbaImage};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

const VALID_ROTATIONS: [u32; 4] = [0, 90, 180, 270];

#[derive(Clone)]
pub struct VisionImage {
    pixels: Arc<RgbaImage>,
    rotation_degrees: u32,
}

impl VisionImage {
    pub fn from_rgba(pixels: RgbaImage) -> Self {
        Self {
            pixels: Arc::new(pixels),
            rotation_degrees: 0,
        }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::from_rgba(image.into_rgba8())
    }

    /// Decode an image file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to decode image {}", path.display()))?;
        Ok(Self::from_dynamic(image))
    }

    /// Decode an encoded image (PNG, JPEG) held in memory.
    pub fn from_memory(bytes: &[u8]) -> Result<Self> {
        let image = image::load_from_memory(bytes).context("failed to decode image bytes")?;
        Ok(Self::from_dynamic(image))
    }

    /// Rotation (clockwise) the toolkit should apply before analysis.
    pub fn with_rotation(mut self, degrees: u32) -> Result<Self> {
        if !VALID_ROTATIONS.contains(&degrees) {
            return Err(anyhow!(
                "rotation must be one of 0, 90, 180 or 270 degrees (got {})",
                degrees
            ));
        }
        self.rotation_degrees = degrees;
        Ok(self)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn rotation_degrees(&self) -> u32 {
        self.rotation_degrees
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

// Pixel data is omitted.
impl fmt::Debug for VisionImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("rotation_degrees", &self.rotation_degrees)
            .finish()
    }
}
