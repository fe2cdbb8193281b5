//! Client configuration passed to providers when a client is built.

use serde::Deserialize;

use crate::detect::result::BarcodeFormat;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextScript {
    #[default]
    Latin,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TextRecognizerOptions {
    pub script: TextScript,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectDetectorMode {
    /// Low-latency mode; assigns tracking ids.
    #[default]
    Stream,
    SingleImage,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectDetectorOptions {
    pub mode: ObjectDetectorMode,
    pub multiple_objects: bool,
    pub classification: bool,
}

impl Default for ObjectDetectorOptions {
    fn default() -> Self {
        Self {
            mode: ObjectDetectorMode::Stream,
            multiple_objects: true,
            classification: true,
        }
    }
}

/// Formats to scan for. Empty means every supported format.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BarcodeScannerOptions {
    pub formats: Vec<BarcodeFormat>,
}

impl BarcodeScannerOptions {
    pub fn accepts(&self, format_code: i32) -> bool {
        self.formats.is_empty()
            || self
                .formats
                .iter()
                .any(|format| format.code() == Some(format_code))
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacePerformanceMode {
    #[default]
    Fast,
    Accurate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceLandmarkMode {
    None,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaceClassificationMode {
    None,
    All,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FaceDetectorOptions {
    pub performance: FacePerformanceMode,
    pub landmarks: FaceLandmarkMode,
    pub classification: FaceClassificationMode,
    pub tracking: bool,
}

impl Default for FaceDetectorOptions {
    fn default() -> Self {
        Self {
            performance: FacePerformanceMode::Fast,
            landmarks: FaceLandmarkMode::All,
            classification: FaceClassificationMode::All,
            tracking: false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageLabelerOptions {
    /// `None` leaves thresholding to the toolkit's own default.
    pub confidence_threshold: Option<f32>,
}

/// Options for every client kind, as one bundle.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientOptions {
    pub text: TextRecognizerOptions,
    pub objects: ObjectDetectorOptions,
    pub barcodes: BarcodeScannerOptions,
    pub faces: FaceDetectorOptions,
    pub labels: ImageLabelerOptions,
}
