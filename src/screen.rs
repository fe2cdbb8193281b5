//! Presentation models for the capture screens.
//!
//! `render` turns a state snapshot into what a screen shows. It owns no state
//! and performs no I/O, so any front-end (the demo CLI, a native shell) can
//! draw the result however it likes.

use std::fmt;

use crate::detect::{BarcodeFormat, DetectionKind};
use crate::state::UiState;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Screen {
    Home,
    TextRecognition,
    ObjectDetection,
    BarcodeScanning,
    FaceDetection,
    ImageLabeling,
}

impl Screen {
    pub const ALL: [Screen; 6] = [
        Screen::Home,
        Screen::TextRecognition,
        Screen::ObjectDetection,
        Screen::BarcodeScanning,
        Screen::FaceDetection,
        Screen::ImageLabeling,
    ];

    pub fn route(self) -> &'static str {
        match self {
            Screen::Home => "home",
            Screen::TextRecognition => "text_recognition",
            Screen::ObjectDetection => "object_detection",
            Screen::BarcodeScanning => "barcode_scanning",
            Screen::FaceDetection => "face_detection",
            Screen::ImageLabeling => "image_labeling",
        }
    }

    pub fn from_route(route: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|screen| screen.route() == route)
    }

    pub fn title(self) -> &'static str {
        match self {
            Screen::Home => "Vision",
            Screen::TextRecognition => "Text Recognition",
            Screen::ObjectDetection => "Object Detection",
            Screen::BarcodeScanning => "Barcode Scanning",
            Screen::FaceDetection => "Face Detection",
            Screen::ImageLabeling => "Image Labeling",
        }
    }

    /// One-line summary shown in the home menu.
    pub fn description(self) -> &'static str {
        match self {
            Screen::Home => "",
            Screen::TextRecognition => "Extract text from images and documents",
            Screen::ObjectDetection => "Detect and classify objects in images",
            Screen::BarcodeScanning => "Scan QR codes and barcodes",
            Screen::FaceDetection => "Detect faces and facial landmarks",
            Screen::ImageLabeling => "Classify objects in images",
        }
    }

    /// Detection kind driven by this screen. `None` for the home menu.
    pub fn kind(self) -> Option<DetectionKind> {
        match self {
            Screen::Home => None,
            Screen::TextRecognition => Some(DetectionKind::Text),
            Screen::ObjectDetection => Some(DetectionKind::Object),
            Screen::BarcodeScanning => Some(DetectionKind::Barcode),
            Screen::FaceDetection => Some(DetectionKind::Face),
            Screen::ImageLabeling => Some(DetectionKind::Label),
        }
    }

    pub fn for_kind(kind: DetectionKind) -> Self {
        match kind {
            DetectionKind::Text => Screen::TextRecognition,
            DetectionKind::Object => Screen::ObjectDetection,
            DetectionKind::Barcode => Screen::BarcodeScanning,
            DetectionKind::Face => Screen::FaceDetection,
            DetectionKind::Label => Screen::ImageLabeling,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MenuEntry {
    pub route: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

/// One card in a result list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultRow {
    pub primary: String,
    pub details: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ScreenContent {
    Menu(Vec<MenuEntry>),
    Loading,
    Error(String),
    Results {
        heading: &'static str,
        rows: Vec<ResultRow>,
    },
    Empty {
        title: &'static str,
        hint: &'static str,
    },
}

/// A new capture may start only when nothing is loading.
pub fn can_capture(state: &UiState) -> bool {
    !state.is_loading
}

pub fn render(screen: Screen, state: &UiState) -> ScreenContent {
    let Some(kind) = screen.kind() else {
        return ScreenContent::Menu(menu());
    };
    if state.is_loading {
        return ScreenContent::Loading;
    }
    if let Some(error) = &state.error {
        return ScreenContent::Error(error.clone());
    }

    let rows = rows_for(kind, state);
    if rows.is_empty() {
        let (title, hint) = empty_copy(kind);
        ScreenContent::Empty { title, hint }
    } else {
        ScreenContent::Results {
            heading: heading(kind),
            rows,
        }
    }
}

fn menu() -> Vec<MenuEntry> {
    Screen::ALL
        .into_iter()
        .filter(|screen| screen.kind().is_some())
        .map(|screen| MenuEntry {
            route: screen.route(),
            title: screen.title(),
            description: screen.description(),
        })
        .collect()
}

fn heading(kind: DetectionKind) -> &'static str {
    match kind {
        DetectionKind::Text => "Recognized Text",
        DetectionKind::Object => "Detected Objects",
        DetectionKind::Barcode => "Scanned Barcodes",
        DetectionKind::Face => "Detected Faces",
        DetectionKind::Label => "Image Labels",
    }
}

fn empty_copy(kind: DetectionKind) -> (&'static str, &'static str) {
    match kind {
        DetectionKind::Text => (
            "No text recognized yet",
            "Tap the camera button to capture an image",
        ),
        DetectionKind::Object => (
            "No objects detected yet",
            "Tap the camera button to detect objects",
        ),
        DetectionKind::Barcode => (
            "No barcodes scanned yet",
            "Tap the camera button to scan barcodes",
        ),
        DetectionKind::Face => (
            "No faces detected yet",
            "Tap the camera button to detect faces",
        ),
        DetectionKind::Label => (
            "No labels detected yet",
            "Tap the camera button to label images",
        ),
    }
}

fn rows_for(kind: DetectionKind, state: &UiState) -> Vec<ResultRow> {
    match kind {
        DetectionKind::Text => state
            .text_results
            .iter()
            .map(|block| ResultRow {
                primary: block.text.clone(),
                details: vec![format!("Confidence: {}%", percent(block.confidence))],
            })
            .collect(),
        DetectionKind::Object => state
            .object_results
            .iter()
            .map(|object| {
                let mut details = vec![format!("Confidence: {}%", percent(object.confidence))];
                if let Some(id) = object.tracking_id {
                    details.push(format!("Tracking ID: {}", id));
                }
                ResultRow {
                    primary: object.label.clone(),
                    details,
                }
            })
            .collect(),
        DetectionKind::Barcode => state
            .barcode_results
            .iter()
            .map(|barcode| ResultRow {
                primary: barcode.raw_value.clone(),
                details: vec![format!(
                    "Format: {}",
                    BarcodeFormat::from_code(barcode.format_code)
                )],
            })
            .collect(),
        DetectionKind::Face => state
            .face_results
            .iter()
            .map(|face| {
                let bounds = face.bounding_box;
                ResultRow {
                    primary: match face.tracking_id {
                        Some(id) => format!("Face {}", id),
                        None => "Face Unknown".to_string(),
                    },
                    details: vec![
                        format!("Landmarks: {}", face.landmarks.len()),
                        format!(
                            "Bounds: ({}, {}) to ({}, {})",
                            bounds.left, bounds.top, bounds.right, bounds.bottom
                        ),
                    ],
                }
            })
            .collect(),
        DetectionKind::Label => state
            .label_results
            .iter()
            .map(|label| ResultRow {
                primary: label.label.clone(),
                details: vec![format!("{}%", percent(label.confidence))],
            })
            .collect(),
    }
}

/// Whole percent, truncated.
fn percent(confidence: f32) -> i32 {
    (confidence * 100.0) as i32
}

impl fmt::Display for ScreenContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScreenContent::Menu(entries) => {
                for entry in entries {
                    writeln!(f, "{:<18} {}", entry.title, entry.description)?;
                }
                Ok(())
            }
            ScreenContent::Loading => writeln!(f, "Processing…"),
            ScreenContent::Error(message) => writeln!(f, "Error: {}", message),
            ScreenContent::Results { heading, rows } => {
                writeln!(f, "{}", heading)?;
                for row in rows {
                    writeln!(f, "  {}", row.primary)?;
                    for detail in &row.details {
                        writeln!(f, "    {}", detail)?;
                    }
                }
                Ok(())
            }
            ScreenContent::Empty { title, hint } => {
                writeln!(f, "{}", title)?;
                writeln!(f, "{}", hint)
            }
        }
    }
}
