//! Capture Vision
//!
//! On-device vision features behind one awaitable interface: text
//! recognition, object detection, barcode scanning, face detection and image
//! labeling.
//!
//! # Architecture
//!
//! Native vision clients report through a single completion callback. The
//! crate keeps them at arm's length:
//!
//! 1. **Providers build clients**: a `VisionProvider` constructs one client
//!    per request from `ClientOptions`.
//! 2. **Adapters await completions**: `VisionAdapter` turns the callback into
//!    a future and maps native records into plain result types.
//! 3. **State is replaced, never edited**: `ResultAggregator` publishes a
//!    fresh `UiState` snapshot on every transition.
//! 4. **Captures are decoded before detection**: the capture flow hands over
//!    a file path, and only a decoded `VisionImage` reaches a client.
//!
//! # Module Structure
//!
//! - `detect`: result types, native client traits, provider registry, stub provider
//! - `adapter`: callback-to-future bridge and the `VisionRepository` trait
//! - `state`: `UiState` and the aggregator
//! - `session`: per-screen orchestration and cancellation
//! - `ingest`: capture sources
//! - `frame`: decoded still images
//! - `screen`: presentation models
//! - `config`: JSON config file plus environment overrides

pub mod adapter;
pub mod config;
pub mod detect;
pub mod frame;
pub mod ingest;
pub mod screen;
pub mod session;
pub mod state;

pub use adapter::{await_completion, VisionAdapter, VisionRepository};
pub use config::{CaptureSettings, VisionConfig};
pub use detect::{
    Barcode, BarcodeFormat, BoundingBox, DetectedFace, DetectedObject, DetectionKind,
    DetectionResult, ImageLabel, Landmark, NativeError, Point, ProviderRegistry, TextBlock,
    VisionProvider,
};
pub use frame::VisionImage;
pub use ingest::{decode_capture, CaptureError, CaptureEvent, CaptureSource, FileConfig, FileSource};
pub use screen::{can_capture, render, Screen, ScreenContent};
pub use session::VisionSession;
pub use state::{ResultAggregator, StateWatcher, UiState};
