use serde::Deserialize;
use std::fmt;

use crate::detect::options::{
    BarcodeScannerOptions, FaceDetectorOptions, ImageLabelerOptions, ObjectDetectorOptions,
    TextRecognizerOptions,
};
use crate::detect::result::{BoundingBox, DetectionKind, Point};
use crate::frame::VisionImage;

/// Completion handed to a native client. Invoked exactly once.
pub type Completion<T> = Box<dyn FnOnce(Result<Vec<T>, NativeError>) + Send + 'static>;

/// One-shot native vision client.
///
/// The client reports through `completion` on whatever thread its own
/// dispatch policy picks. It may also drop the completion without calling it
/// (for example when torn down mid-flight); callers treat that as a failure.
pub trait NativeClient<T>: Send {
    fn process(&self, image: VisionImage, completion: Completion<T>);
}

/// Entry point of a host vision toolkit.
///
/// Every constructor returns a fresh client; callers build one per request
/// and drop it afterwards.
pub trait VisionProvider: Send + Sync {
    /// Provider identifier.
    fn name(&self) -> &'static str;

    /// Returns true when the provider offers a detection kind.
    fn supports(&self, kind: DetectionKind) -> bool;

    fn text_recognizer(
        &self,
        _options: &TextRecognizerOptions,
    ) -> Result<Box<dyn NativeClient<NativeTextBlock>>, NativeError> {
        Err(NativeError::unsupported(self.name(), DetectionKind::Text))
    }

    fn object_detector(
        &self,
        _options: &ObjectDetectorOptions,
    ) -> Result<Box<dyn NativeClient<NativeObject>>, NativeError> {
        Err(NativeError::unsupported(self.name(), DetectionKind::Object))
    }

    fn barcode_scanner(
        &self,
        _options: &BarcodeScannerOptions,
    ) -> Result<Box<dyn NativeClient<NativeBarcode>>, NativeError> {
        Err(NativeError::unsupported(self.name(), DetectionKind::Barcode))
    }

    fn face_detector(
        &self,
        _options: &FaceDetectorOptions,
    ) -> Result<Box<dyn NativeClient<NativeFace>>, NativeError> {
        Err(NativeError::unsupported(self.name(), DetectionKind::Face))
    }

    fn image_labeler(
        &self,
        _options: &ImageLabelerOptions,
    ) -> Result<Box<dyn NativeClient<NativeLabel>>, NativeError> {
        Err(NativeError::unsupported(self.name(), DetectionKind::Label))
    }
}

// ----------------------------------------------------------------------------
// Records as the toolkit reports them
// ----------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NativeTextBlock {
    pub text: String,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NativeLabel {
    pub text: String,
    pub confidence: f32,
    #[serde(default)]
    pub index: i32,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NativeObject {
    /// Classification labels, best first.
    #[serde(default)]
    pub labels: Vec<NativeLabel>,
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub tracking_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NativeBarcode {
    #[serde(default)]
    pub raw_value: Option<String>,
    pub format: i32,
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NativeLandmark {
    pub landmark_type: i32,
    pub position: Point,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NativeFace {
    pub bounding_box: BoundingBox,
    #[serde(default)]
    pub landmarks: Vec<NativeLandmark>,
    #[serde(default)]
    pub tracking_id: Option<i32>,
}

// ----------------------------------------------------------------------------
// Errors
// ----------------------------------------------------------------------------

/// Failure reported by (or on behalf of) a native client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeError {
    message: Option<String>,
}

impl NativeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
        }
    }

    /// A failure with no message attached.
    pub fn silent() -> Self {
        Self { message: None }
    }

    pub fn unsupported(provider: &str, kind: DetectionKind) -> Self {
        Self::new(format!("provider '{}' does not support {}", provider, kind))
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message().unwrap_or("native vision client failed"))
    }
}

impl std::error::Error for NativeError {}
