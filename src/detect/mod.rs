mod backend;
pub mod backends;
pub mod options;
mod registry;
mod result;

pub use backend::{
    Completion, NativeBarcode, NativeClient, NativeError, NativeFace, NativeLabel,
    NativeLandmark, NativeObject, NativeTextBlock, VisionProvider,
};
pub use backends::{StubOutcome, StubProvider, StubScript};
pub use options::ClientOptions;
pub use registry::ProviderRegistry;
pub use result::{
    landmark_name, Barcode, BarcodeFormat, BoundingBox, DetectedFace, DetectedObject,
    DetectionKind, DetectionResult, ImageLabel, Landmark, Point, TextBlock,
};
