use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::detect::options::{
    BarcodeScannerOptions, ClientOptions, FaceClassificationMode, FaceDetectorOptions,
    FaceLandmarkMode, FacePerformanceMode, ImageLabelerOptions, ObjectDetectorMode,
    ObjectDetectorOptions,
};
use crate::detect::BarcodeFormat;

const DEFAULT_PROVIDER: &str = "stub";
const VALID_ROTATIONS: [u32; 4] = [0, 90, 180, 270];

#[derive(Debug, Deserialize, Default)]
struct VisionConfigFile {
    provider: Option<String>,
    stub_script: Option<PathBuf>,
    capture: Option<CaptureConfigFile>,
    objects: Option<ObjectsConfigFile>,
    barcodes: Option<BarcodesConfigFile>,
    faces: Option<FacesConfigFile>,
    labels: Option<LabelsConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct CaptureConfigFile {
    path: Option<String>,
    rotation_degrees: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct ObjectsConfigFile {
    mode: Option<ObjectDetectorMode>,
    multiple_objects: Option<bool>,
    classification: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct BarcodesConfigFile {
    formats: Option<Vec<BarcodeFormat>>,
}

#[derive(Debug, Deserialize, Default)]
struct FacesConfigFile {
    performance: Option<FacePerformanceMode>,
    landmarks: Option<bool>,
    classification: Option<bool>,
    tracking: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
struct LabelsConfigFile {
    confidence_threshold: Option<f32>,
}

#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// Name of the provider to prefer.
    pub provider: String,
    /// Scripted replies for the stub provider.
    pub stub_script: Option<PathBuf>,
    pub capture: CaptureSettings,
    pub options: ClientOptions,
}

#[derive(Debug, Clone, Default)]
pub struct CaptureSettings {
    pub path: Option<String>,
    pub rotation_degrees: u32,
}

impl VisionConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("VISION_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: VisionConfigFile) -> Self {
        let provider = file
            .provider
            .unwrap_or_else(|| DEFAULT_PROVIDER.to_string());
        let capture = CaptureSettings {
            path: file.capture.as_ref().and_then(|c| c.path.clone()),
            rotation_degrees: file
                .capture
                .as_ref()
                .and_then(|c| c.rotation_degrees)
                .unwrap_or(0),
        };

        let object_defaults = ObjectDetectorOptions::default();
        let objects = file.objects.unwrap_or_default();
        let objects = ObjectDetectorOptions {
            mode: objects.mode.unwrap_or(object_defaults.mode),
            multiple_objects: objects
                .multiple_objects
                .unwrap_or(object_defaults.multiple_objects),
            classification: objects
                .classification
                .unwrap_or(object_defaults.classification),
        };

        let face_defaults = FaceDetectorOptions::default();
        let faces = file.faces.unwrap_or_default();
        let faces = FaceDetectorOptions {
            performance: faces.performance.unwrap_or(face_defaults.performance),
            landmarks: match faces.landmarks {
                Some(false) => FaceLandmarkMode::None,
                Some(true) => FaceLandmarkMode::All,
                None => face_defaults.landmarks,
            },
            classification: match faces.classification {
                Some(false) => FaceClassificationMode::None,
                Some(true) => FaceClassificationMode::All,
                None => face_defaults.classification,
            },
            tracking: faces.tracking.unwrap_or(face_defaults.tracking),
        };

        let options = ClientOptions {
            objects,
            barcodes: BarcodeScannerOptions {
                formats: file
                    .barcodes
                    .and_then(|b| b.formats)
                    .unwrap_or_default(),
            },
            faces,
            labels: ImageLabelerOptions {
                confidence_threshold: file.labels.and_then(|l| l.confidence_threshold),
            },
            ..ClientOptions::default()
        };

        Self {
            provider,
            stub_script: file.stub_script,
            capture,
            options,
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(provider) = std::env::var("VISION_PROVIDER") {
            if !provider.trim().is_empty() {
                self.provider = provider.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("VISION_STUB_SCRIPT") {
            if !path.trim().is_empty() {
                self.stub_script = Some(PathBuf::from(path));
            }
        }
        if let Ok(path) = std::env::var("VISION_CAPTURE_PATH") {
            if !path.trim().is_empty() {
                self.capture.path = Some(path);
            }
        }
        if let Ok(mode) = std::env::var("VISION_OBJECT_MODE") {
            self.options.objects.mode = match mode.trim() {
                "stream" => ObjectDetectorMode::Stream,
                "single_image" => ObjectDetectorMode::SingleImage,
                other => {
                    return Err(anyhow!(
                        "VISION_OBJECT_MODE must be 'stream' or 'single_image' (got '{}')",
                        other
                    ))
                }
            };
        }
        if let Ok(mode) = std::env::var("VISION_FACE_PERFORMANCE") {
            self.options.faces.performance = match mode.trim() {
                "fast" => FacePerformanceMode::Fast,
                "accurate" => FacePerformanceMode::Accurate,
                other => {
                    return Err(anyhow!(
                        "VISION_FACE_PERFORMANCE must be 'fast' or 'accurate' (got '{}')",
                        other
                    ))
                }
            };
        }
        if let Ok(formats) = std::env::var("VISION_BARCODE_FORMATS") {
            let parsed = split_csv(&formats)
                .iter()
                .map(|name| {
                    BarcodeFormat::from_name(name)
                        .ok_or_else(|| anyhow!("unknown barcode format '{}'", name))
                })
                .collect::<Result<Vec<_>>>()?;
            if !parsed.is_empty() {
                self.options.barcodes.formats = parsed;
            }
        }
        if let Ok(threshold) = std::env::var("VISION_LABEL_THRESHOLD") {
            let value: f32 = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("VISION_LABEL_THRESHOLD must be a number"))?;
            self.options.labels.confidence_threshold = Some(value);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.provider.trim().is_empty() {
            return Err(anyhow!("provider name must not be empty"));
        }
        if let Some(threshold) = self.options.labels.confidence_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(anyhow!(
                    "label confidence threshold must be within 0..=1 (got {})",
                    threshold
                ));
            }
        }
        if !VALID_ROTATIONS.contains(&self.capture.rotation_degrees) {
            return Err(anyhow!(
                "capture rotation must be 0, 90, 180 or 270 degrees (got {})",
                self.capture.rotation_degrees
            ));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<VisionConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|entry| entry.trim())
        .filter(|entry| !entry.is_empty())
        .map(|entry| entry.to_string())
        .collect()
}
