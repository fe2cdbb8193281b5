use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::detect::backend::{
    Completion, NativeBarcode, NativeClient, NativeError, NativeFace, NativeLabel, NativeObject,
    NativeTextBlock, VisionProvider,
};
use crate::detect::options::{
    BarcodeScannerOptions, FaceDetectorOptions, FaceLandmarkMode, ImageLabelerOptions,
    ObjectDetectorOptions, TextRecognizerOptions,
};
use crate::detect::result::DetectionKind;
use crate::frame::VisionImage;

/// What a stub client reports for one request.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StubOutcome<T> {
    Detections(Vec<T>),
    Failure(Option<String>),
    /// Drop the completion without invoking it.
    Dropped,
}

/// Scripted replies per detection kind. Unscripted kinds are unsupported.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct StubScript {
    #[serde(default)]
    pub text: Option<StubOutcome<NativeTextBlock>>,
    #[serde(default)]
    pub objects: Option<StubOutcome<NativeObject>>,
    #[serde(default)]
    pub barcodes: Option<StubOutcome<NativeBarcode>>,
    #[serde(default)]
    pub faces: Option<StubOutcome<NativeFace>>,
    #[serde(default)]
    pub labels: Option<StubOutcome<NativeLabel>>,
    /// Delay before the completion fires, in milliseconds.
    #[serde(default)]
    pub delay_ms: u64,
}

impl StubScript {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow!("failed to read stub script {}: {}", path.display(), e))?;
        serde_json::from_str(&raw)
            .map_err(|e| anyhow!("invalid stub script {}: {}", path.display(), e))
    }
}

/// Scripted provider for tests and demos.
///
/// Completions fire from a spawned thread, as a native toolkit would call back
/// from its own executor.
pub struct StubProvider {
    script: StubScript,
    clients_built: Arc<AtomicUsize>,
}

impl StubProvider {
    pub fn new(script: StubScript) -> Self {
        Self {
            script,
            clients_built: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared counter of clients constructed so far.
    pub fn clients_built(&self) -> Arc<AtomicUsize> {
        self.clients_built.clone()
    }

    fn delay(&self) -> Duration {
        Duration::from_millis(self.script.delay_ms)
    }

    fn build<T: Clone + Send + 'static>(
        &self,
        kind: DetectionKind,
        outcome: &Option<StubOutcome<T>>,
        refine: Refine<T>,
    ) -> Result<Box<dyn NativeClient<T>>, NativeError> {
        let outcome = outcome
            .clone()
            .ok_or_else(|| NativeError::unsupported(self.name(), kind))?;
        self.clients_built.fetch_add(1, Ordering::SeqCst);
        log::debug!("stub: built {} client", kind);
        Ok(Box::new(StubClient {
            outcome,
            delay: self.delay(),
            refine,
        }))
    }
}

impl Default for StubProvider {
    fn default() -> Self {
        Self::new(StubScript::default())
    }
}

impl VisionProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn supports(&self, kind: DetectionKind) -> bool {
        match kind {
            DetectionKind::Text => self.script.text.is_some(),
            DetectionKind::Object => self.script.objects.is_some(),
            DetectionKind::Barcode => self.script.barcodes.is_some(),
            DetectionKind::Face => self.script.faces.is_some(),
            DetectionKind::Label => self.script.labels.is_some(),
        }
    }

    fn text_recognizer(
        &self,
        _options: &TextRecognizerOptions,
    ) -> Result<Box<dyn NativeClient<NativeTextBlock>>, NativeError> {
        self.build(
            DetectionKind::Text,
            &self.script.text,
            Arc::new(|blocks: Vec<NativeTextBlock>| blocks),
        )
    }

    fn object_detector(
        &self,
        options: &ObjectDetectorOptions,
    ) -> Result<Box<dyn NativeClient<NativeObject>>, NativeError> {
        let options = options.clone();
        self.build(
            DetectionKind::Object,
            &self.script.objects,
            Arc::new(move |mut objects: Vec<NativeObject>| {
                if !options.multiple_objects {
                    objects.truncate(1);
                }
                if !options.classification {
                    objects.iter_mut().for_each(|object| object.labels.clear());
                }
                objects
            }),
        )
    }

    fn barcode_scanner(
        &self,
        options: &BarcodeScannerOptions,
    ) -> Result<Box<dyn NativeClient<NativeBarcode>>, NativeError> {
        let options = options.clone();
        self.build(
            DetectionKind::Barcode,
            &self.script.barcodes,
            Arc::new(move |barcodes: Vec<NativeBarcode>| {
                barcodes
                    .into_iter()
                    .filter(|barcode| options.accepts(barcode.format))
                    .collect()
            }),
        )
    }

    fn face_detector(
        &self,
        options: &FaceDetectorOptions,
    ) -> Result<Box<dyn NativeClient<NativeFace>>, NativeError> {
        let options = options.clone();
        self.build(
            DetectionKind::Face,
            &self.script.faces,
            Arc::new(move |mut faces: Vec<NativeFace>| {
                if options.landmarks == FaceLandmarkMode::None {
                    faces.iter_mut().for_each(|face| face.landmarks.clear());
                }
                if !options.tracking {
                    faces.iter_mut().for_each(|face| face.tracking_id = None);
                }
                faces
            }),
        )
    }

    fn image_labeler(
        &self,
        options: &ImageLabelerOptions,
    ) -> Result<Box<dyn NativeClient<NativeLabel>>, NativeError> {
        let threshold = options.confidence_threshold;
        self.build(
            DetectionKind::Label,
            &self.script.labels,
            Arc::new(move |labels: Vec<NativeLabel>| match threshold {
                Some(threshold) => labels
                    .into_iter()
                    .filter(|label| label.confidence >= threshold)
                    .collect(),
                None => labels,
            }),
        )
    }
}

/// Option effects the stub applies to its scripted detections, standing in
/// for what the real toolkit does with client options.
type Refine<T> = Arc<dyn Fn(Vec<T>) -> Vec<T> + Send + Sync>;

struct StubClient<T> {
    outcome: StubOutcome<T>,
    delay: Duration,
    refine: Refine<T>,
}

impl<T: Clone + Send + 'static> NativeClient<T> for StubClient<T> {
    fn process(&self, image: VisionImage, completion: Completion<T>) {
        let outcome = self.outcome.clone();
        let delay = self.delay;
        let refine = self.refine.clone();

        std::thread::spawn(move || {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            log::trace!(
                "stub: completing for {}x{} image",
                image.width(),
                image.height()
            );
            match outcome {
                StubOutcome::Detections(items) => completion(Ok(refine(items))),
                StubOutcome::Failure(Some(message)) => completion(Err(NativeError::new(message))),
                StubOutcome::Failure(None) => completion(Err(NativeError::silent())),
                StubOutcome::Dropped => drop(completion),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::BoundingBox;
    use std::sync::mpsc;

    fn tiny_image() -> VisionImage {
        VisionImage::from_rgba(image::RgbaImage::new(2, 2))
    }

    fn run<T: Send + 'static>(
        client: Box<dyn NativeClient<T>>,
    ) -> Option<Result<Vec<T>, NativeError>> {
        let (tx, rx) = mpsc::channel();
        client.process(
            tiny_image(),
            Box::new(move |result| {
                let _ = tx.send(result);
            }),
        );
        rx.recv_timeout(Duration::from_secs(2)).ok()
    }

    #[test]
    fn unscripted_kinds_are_unsupported() {
        let provider = StubProvider::default();
        assert!(!provider.supports(DetectionKind::Text));
        assert!(provider
            .text_recognizer(&TextRecognizerOptions::default())
            .is_err());
        assert_eq!(provider.clients_built().load(Ordering::SeqCst), 0);
    }

    #[test]
    fn labeler_threshold_filters_low_confidence() {
        let provider = StubProvider::new(StubScript {
            labels: Some(StubOutcome::Detections(vec![
                NativeLabel {
                    text: "Cat".into(),
                    confidence: 0.9,
                    index: 0,
                },
                NativeLabel {
                    text: "Rug".into(),
                    confidence: 0.2,
                    index: 1,
                },
            ])),
            ..StubScript::default()
        });
        let client = provider
            .image_labeler(&ImageLabelerOptions {
                confidence_threshold: Some(0.5),
            })
            .unwrap();
        let labels = run(client).unwrap().unwrap();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].text, "Cat");
    }

    #[test]
    fn single_object_mode_keeps_first_detection() {
        let object = NativeObject {
            labels: vec![],
            bounding_box: BoundingBox::new(0, 0, 1, 1),
            tracking_id: None,
        };
        let provider = StubProvider::new(StubScript {
            objects: Some(StubOutcome::Detections(vec![object.clone(), object])),
            ..StubScript::default()
        });
        let options = ObjectDetectorOptions {
            multiple_objects: false,
            ..ObjectDetectorOptions::default()
        };
        let objects = run(provider.object_detector(&options).unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn dropped_outcome_never_calls_back() {
        let provider = StubProvider::new(StubScript {
            text: Some(StubOutcome::Dropped),
            ..StubScript::default()
        });
        let client = provider
            .text_recognizer(&TextRecognizerOptions::default())
            .unwrap();
        assert!(run(client).is_none());
        assert_eq!(provider.clients_built().load(Ordering::SeqCst), 1);
    }

    #[test]
    fn parses_script_json() {
        let script: StubScript = serde_json::from_str(
            r#"{
                "text": {"detections": [{"text": "hello"}]},
                "faces": {"failure": "no model"},
                "labels": {"failure": null},
                "delay_ms": 5
            }"#,
        )
        .unwrap();
        assert!(matches!(script.text, Some(StubOutcome::Detections(ref v)) if v.len() == 1));
        assert!(matches!(script.faces, Some(StubOutcome::Failure(Some(_)))));
        assert!(matches!(script.labels, Some(StubOutcome::Failure(None))));
        assert_eq!(script.delay_ms, 5);
    }
}
