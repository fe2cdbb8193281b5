use serde::{Deserialize, Serialize};
use std::fmt;

/// Pixel rectangle as reported by the vision toolkit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl BoundingBox {
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// A single facial landmark. `type_code` is the toolkit's landmark constant.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Landmark {
    pub type_code: i32,
    pub position: Point,
}

impl Landmark {
    pub fn type_name(&self) -> &'static str {
        landmark_name(self.type_code)
    }
}

/// One recognized block of text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TextBlock {
    pub text: String,
    pub confidence: f32,
    pub bounding_box: Option<BoundingBox>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectedObject {
    pub label: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
    pub tracking_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Barcode {
    /// Never absent; a barcode without a decodable payload carries "".
    pub raw_value: String,
    pub format_code: i32,
    pub bounding_box: Option<BoundingBox>,
}

impl Barcode {
    pub fn format(&self) -> BarcodeFormat {
        BarcodeFormat::from_code(self.format_code)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DetectedFace {
    pub bounding_box: BoundingBox,
    pub landmarks: Vec<Landmark>,
    /// Only populated when the detector runs with tracking enabled.
    pub tracking_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ImageLabel {
    pub label: String,
    pub confidence: f32,
}

/// Result of one detection, tagged by feature kind.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionResult {
    Text(TextBlock),
    Object(DetectedObject),
    Barcode(Barcode),
    Face(DetectedFace),
    Label(ImageLabel),
}

impl DetectionResult {
    pub fn kind(&self) -> DetectionKind {
        match self {
            DetectionResult::Text(_) => DetectionKind::Text,
            DetectionResult::Object(_) => DetectionKind::Object,
            DetectionResult::Barcode(_) => DetectionKind::Barcode,
            DetectionResult::Face(_) => DetectionKind::Face,
            DetectionResult::Label(_) => DetectionKind::Label,
        }
    }
}

impl From<TextBlock> for DetectionResult {
    fn from(value: TextBlock) -> Self {
        DetectionResult::Text(value)
    }
}

impl From<DetectedObject> for DetectionResult {
    fn from(value: DetectedObject) -> Self {
        DetectionResult::Object(value)
    }
}

impl From<Barcode> for DetectionResult {
    fn from(value: Barcode) -> Self {
        DetectionResult::Barcode(value)
    }
}

impl From<DetectedFace> for DetectionResult {
    fn from(value: DetectedFace) -> Self {
        DetectionResult::Face(value)
    }
}

impl From<ImageLabel> for DetectionResult {
    fn from(value: ImageLabel) -> Self {
        DetectionResult::Label(value)
    }
}

/// The five vision features a provider can offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionKind {
    Text,
    Object,
    Barcode,
    Face,
    Label,
}

impl DetectionKind {
    pub const ALL: [DetectionKind; 5] = [
        DetectionKind::Text,
        DetectionKind::Object,
        DetectionKind::Barcode,
        DetectionKind::Face,
        DetectionKind::Label,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            DetectionKind::Text => "Text recognition",
            DetectionKind::Object => "Object detection",
            DetectionKind::Barcode => "Barcode scanning",
            DetectionKind::Face => "Face detection",
            DetectionKind::Label => "Image labeling",
        }
    }

    /// Message used when a failure carries no text of its own.
    pub fn failure_message(self) -> String {
        format!("{} failed", self.display_name())
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Barcode symbologies, keyed by the toolkit's bit-flag format codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BarcodeFormat {
    #[serde(rename = "CODE_128")]
    Code128,
    #[serde(rename = "CODE_39")]
    Code39,
    #[serde(rename = "CODE_93")]
    Code93,
    Codabar,
    DataMatrix,
    #[serde(rename = "EAN_13")]
    Ean13,
    #[serde(rename = "EAN_8")]
    Ean8,
    Itf,
    QrCode,
    UpcA,
    UpcE,
    Pdf417,
    Aztec,
    /// Reported by the toolkit only; never a format to scan for.
    #[serde(skip_deserializing)]
    Unknown,
}

impl BarcodeFormat {
    pub const ALL: [BarcodeFormat; 13] = [
        BarcodeFormat::Code128,
        BarcodeFormat::Code39,
        BarcodeFormat::Code93,
        BarcodeFormat::Codabar,
        BarcodeFormat::DataMatrix,
        BarcodeFormat::Ean13,
        BarcodeFormat::Ean8,
        BarcodeFormat::Itf,
        BarcodeFormat::QrCode,
        BarcodeFormat::UpcA,
        BarcodeFormat::UpcE,
        BarcodeFormat::Pdf417,
        BarcodeFormat::Aztec,
    ];

    /// Parse a format name such as "QR_CODE" (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|format| format.name().eq_ignore_ascii_case(name))
    }

    pub fn from_code(code: i32) -> Self {
        match code {
            0x0001 => BarcodeFormat::Code128,
            0x0002 => BarcodeFormat::Code39,
            0x0004 => BarcodeFormat::Code93,
            0x0008 => BarcodeFormat::Codabar,
            0x0010 => BarcodeFormat::DataMatrix,
            0x0020 => BarcodeFormat::Ean13,
            0x0040 => BarcodeFormat::Ean8,
            0x0080 => BarcodeFormat::Itf,
            0x0100 => BarcodeFormat::QrCode,
            0x0200 => BarcodeFormat::UpcA,
            0x0400 => BarcodeFormat::UpcE,
            0x0800 => BarcodeFormat::Pdf417,
            0x1000 => BarcodeFormat::Aztec,
            _ => BarcodeFormat::Unknown,
        }
    }

    /// Format code, or `None` for `Unknown`.
    pub fn code(self) -> Option<i32> {
        let code = match self {
            BarcodeFormat::Code128 => 0x0001,
            BarcodeFormat::Code39 => 0x0002,
            BarcodeFormat::Code93 => 0x0004,
            BarcodeFormat::Codabar => 0x0008,
            BarcodeFormat::DataMatrix => 0x0010,
            BarcodeFormat::Ean13 => 0x0020,
            BarcodeFormat::Ean8 => 0x0040,
            BarcodeFormat::Itf => 0x0080,
            BarcodeFormat::QrCode => 0x0100,
            BarcodeFormat::UpcA => 0x0200,
            BarcodeFormat::UpcE => 0x0400,
            BarcodeFormat::Pdf417 => 0x0800,
            BarcodeFormat::Aztec => 0x1000,
            BarcodeFormat::Unknown => return None,
        };
        Some(code)
    }

    pub fn name(self) -> &'static str {
        match self {
            BarcodeFormat::Code128 => "CODE_128",
            BarcodeFormat::Code39 => "CODE_39",
            BarcodeFormat::Code93 => "CODE_93",
            BarcodeFormat::Codabar => "CODABAR",
            BarcodeFormat::DataMatrix => "DATA_MATRIX",
            BarcodeFormat::Ean13 => "EAN_13",
            BarcodeFormat::Ean8 => "EAN_8",
            BarcodeFormat::Itf => "ITF",
            BarcodeFormat::QrCode => "QR_CODE",
            BarcodeFormat::UpcA => "UPC_A",
            BarcodeFormat::UpcE => "UPC_E",
            BarcodeFormat::Pdf417 => "PDF417",
            BarcodeFormat::Aztec => "AZTEC",
            BarcodeFormat::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for BarcodeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn landmark_name(type_code: i32) -> &'static str {
    match type_code {
        0 => "MOUTH_BOTTOM",
        1 => "LEFT_CHEEK",
        3 => "LEFT_EAR",
        4 => "LEFT_EYE",
        5 => "MOUTH_LEFT",
        6 => "NOSE_BASE",
        7 => "RIGHT_CHEEK",
        9 => "RIGHT_EAR",
        10 => "RIGHT_EYE",
        11 => "MOUTH_RIGHT",
        _ => "UNKNOWN",
    }
}
