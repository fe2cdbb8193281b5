//! Async adapters over callback-style vision clients.
//!
//! Each operation builds a fresh client from the selected provider, submits
//! the image, and suspends on a oneshot channel until the client's single
//! completion fires. Dropping the returned future detaches from the native
//! call; a completion that arrives later is discarded.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::detect::{
    Barcode, ClientOptions, DetectedFace, DetectedObject, DetectionKind, DetectionResult,
    ImageLabel, Landmark, NativeBarcode, NativeClient, NativeError, NativeFace, NativeLabel,
    NativeObject, NativeTextBlock, ProviderRegistry, TextBlock, VisionProvider,
};
use crate::frame::VisionImage;

/// Confidence reported for every text block. The toolkit exposes none.
pub const TEXT_CONFIDENCE: f32 = 1.0;

/// Label given to objects the classifier could not name.
pub const UNKNOWN_OBJECT_LABEL: &str = "Unknown";

/// Submit `image` to a one-shot client and wait for its completion.
pub async fn await_completion<T: Send + 'static>(
    client: Box<dyn NativeClient<T>>,
    image: VisionImage,
) -> Result<Vec<T>, NativeError> {
    let (tx, rx) = oneshot::channel();
    client.process(
        image,
        Box::new(move |result| {
            if tx.send(result).is_err() {
                log::debug!("completion arrived after the caller went away, discarding");
            }
        }),
    );
    let outcome = rx.await;
    drop(client);
    outcome.map_err(|_| NativeError::new("vision client dropped its completion"))?
}

// ----------------------------------------------------------------------------
// Mapping from native records
// ----------------------------------------------------------------------------

pub fn map_text_blocks(blocks: Vec<NativeTextBlock>) -> Vec<TextBlock> {
    blocks
        .into_iter()
        .map(|block| TextBlock {
            text: block.text,
            confidence: TEXT_CONFIDENCE,
            bounding_box: block.bounding_box,
        })
        .collect()
}

pub fn map_objects(objects: Vec<NativeObject>) -> Vec<DetectedObject> {
    objects
        .into_iter()
        .map(|object| {
            let (label, confidence) = match object.labels.into_iter().next() {
                Some(first) => (first.text, first.confidence),
                None => (UNKNOWN_OBJECT_LABEL.to_string(), 0.0),
            };
            DetectedObject {
                label,
                confidence,
                bounding_box: object.bounding_box,
                tracking_id: object.tracking_id,
            }
        })
        .collect()
}

pub fn map_barcodes(barcodes: Vec<NativeBarcode>) -> Vec<Barcode> {
    barcodes
        .into_iter()
        .map(|barcode| Barcode {
            raw_value: barcode.raw_value.unwrap_or_default(),
            format_code: barcode.format,
            bounding_box: barcode.bounding_box,
        })
        .collect()
}

pub fn map_faces(faces: Vec<NativeFace>) -> Vec<DetectedFace> {
    faces
        .into_iter()
        .map(|face| DetectedFace {
            bounding_box: face.bounding_box,
            landmarks: face
                .landmarks
                .into_iter()
                .map(|landmark| Landmark {
                    type_code: landmark.landmark_type,
                    position: landmark.position,
                })
                .collect(),
            tracking_id: face.tracking_id,
        })
        .collect()
}

pub fn map_labels(labels: Vec<NativeLabel>) -> Vec<ImageLabel> {
    labels
        .into_iter()
        .map(|label| ImageLabel {
            label: label.text,
            confidence: label.confidence,
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Repository
// ----------------------------------------------------------------------------

/// Awaitable vision operations, one per detection kind.
#[async_trait]
pub trait VisionRepository: Send + Sync {
    async fn recognize_text(&self, image: VisionImage) -> Result<Vec<TextBlock>, NativeError>;

    async fn detect_objects(&self, image: VisionImage)
        -> Result<Vec<DetectedObject>, NativeError>;

    async fn scan_barcodes(&self, image: VisionImage) -> Result<Vec<Barcode>, NativeError>;

    async fn detect_faces(&self, image: VisionImage) -> Result<Vec<DetectedFace>, NativeError>;

    async fn label_image(&self, image: VisionImage) -> Result<Vec<ImageLabel>, NativeError>;

    /// Run any kind and return its results as tagged values.
    async fn detect(
        &self,
        kind: DetectionKind,
        image: VisionImage,
    ) -> Result<Vec<DetectionResult>, NativeError> {
        let results = match kind {
            DetectionKind::Text => into_tagged(self.recognize_text(image).await?),
            DetectionKind::Object => into_tagged(self.detect_objects(image).await?),
            DetectionKind::Barcode => into_tagged(self.scan_barcodes(image).await?),
            DetectionKind::Face => into_tagged(self.detect_faces(image).await?),
            DetectionKind::Label => into_tagged(self.label_image(image).await?),
        };
        Ok(results)
    }
}

fn into_tagged<R: Into<DetectionResult>>(items: Vec<R>) -> Vec<DetectionResult> {
    items.into_iter().map(Into::into).collect()
}

/// Repository backed by registered vision providers.
///
/// The provider is chosen per call, and every call builds its own client.
pub struct VisionAdapter {
    registry: Arc<ProviderRegistry>,
    options: ClientOptions,
}

impl VisionAdapter {
    pub fn new(registry: Arc<ProviderRegistry>, options: ClientOptions) -> Self {
        Self { registry, options }
    }

    /// Adapter over a single provider with default client options.
    pub fn with_provider<P: VisionProvider + 'static>(provider: P) -> Self {
        let mut registry = ProviderRegistry::new();
        registry.register(provider);
        Self::new(Arc::new(registry), ClientOptions::default())
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    fn provider(&self, kind: DetectionKind) -> Result<Arc<dyn VisionProvider>, NativeError> {
        self.registry
            .provider_for(kind)
            .map_err(|e| NativeError::new(e.to_string()))
    }

    async fn run<T, R>(
        &self,
        kind: DetectionKind,
        client: Result<Box<dyn NativeClient<T>>, NativeError>,
        image: VisionImage,
        map: fn(Vec<T>) -> Vec<R>,
    ) -> Result<Vec<R>, NativeError>
    where
        T: Send + 'static,
    {
        log::debug!("{}: submitting {}x{} image", kind, image.width(), image.height());
        let outcome = match client {
            Ok(client) => await_completion(client, image).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(native) => {
                log::debug!("{}: {} detections", kind, native.len());
                Ok(map(native))
            }
            Err(e) => {
                log::error!("{} failed: {}", kind, e);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl VisionRepository for VisionAdapter {
    async fn recognize_text(&self, image: VisionImage) -> Result<Vec<TextBlock>, NativeError> {
        let kind = DetectionKind::Text;
        let client = self
            .provider(kind)
            .and_then(|provider| provider.text_recognizer(&self.options.text));
        self.run(kind, client, image, map_text_blocks).await
    }

    async fn detect_objects(
        &self,
        image: VisionImage,
    ) -> Result<Vec<DetectedObject>, NativeError> {
        let kind = DetectionKind::Object;
        let client = self
            .provider(kind)
            .and_then(|provider| provider.object_detector(&self.options.objects));
        self.run(kind, client, image, map_objects).await
    }

    async fn scan_barcodes(&self, image: VisionImage) -> Result<Vec<Barcode>, NativeError> {
        let kind = DetectionKind::Barcode;
        let client = self
            .provider(kind)
            .and_then(|provider| provider.barcode_scanner(&self.options.barcodes));
        self.run(kind, client, image, map_barcodes).await
    }

    async fn detect_faces(&self, image: VisionImage) -> Result<Vec<DetectedFace>, NativeError> {
        let kind = DetectionKind::Face;
        let client = self
            .provider(kind)
            .and_then(|provider| provider.face_detector(&self.options.faces));
        self.run(kind, client, image, map_faces).await
    }

    async fn label_image(&self, image: VisionImage) -> Result<Vec<ImageLabel>, NativeError> {
        let kind = DetectionKind::Label;
        let client = self
            .provider(kind)
            .and_then(|provider| provider.image_labeler(&self.options.labels));
        self.run(kind, client, image, map_labels).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, NativeLandmark, Point};

    fn label(text: &str, confidence: f32) -> NativeLabel {
        NativeLabel {
            text: text.to_string(),
            confidence,
            index: 0,
        }
    }

    #[test]
    fn text_confidence_is_fixed() {
        let blocks = map_text_blocks(vec![
            NativeTextBlock {
                text: "EXIT".into(),
                bounding_box: None,
            },
            NativeTextBlock {
                text: "Platform 9".into(),
                bounding_box: Some(BoundingBox::new(1, 2, 30, 12)),
            },
        ]);
        assert_eq!(blocks.len(), 2);
        assert!(blocks.iter().all(|b| b.confidence == TEXT_CONFIDENCE));
        assert_eq!(blocks[1].bounding_box, Some(BoundingBox::new(1, 2, 30, 12)));
    }

    #[test]
    fn unlabeled_objects_are_unknown_with_zero_confidence() {
        let objects = map_objects(vec![
            NativeObject {
                labels: vec![],
                bounding_box: BoundingBox::new(0, 0, 10, 10),
                tracking_id: Some(4),
            },
            NativeObject {
                labels: vec![label("Food", 0.72), label("Plant", 0.4)],
                bounding_box: BoundingBox::new(5, 5, 9, 9),
                tracking_id: None,
            },
        ]);
        assert_eq!(objects[0].label, UNKNOWN_OBJECT_LABEL);
        assert_eq!(objects[0].confidence, 0.0);
        assert_eq!(objects[0].tracking_id, Some(4));
        assert_eq!(objects[1].label, "Food");
        assert_eq!(objects[1].confidence, 0.72);
    }

    #[test]
    fn missing_barcode_value_becomes_empty_string() {
        let barcodes = map_barcodes(vec![NativeBarcode {
            raw_value: None,
            format: 0x0100,
            bounding_box: None,
        }]);
        assert_eq!(barcodes[0].raw_value, "");
        assert_eq!(barcodes[0].format_code, 0x0100);
    }

    #[test]
    fn face_landmarks_keep_native_order() {
        let faces = map_faces(vec![NativeFace {
            bounding_box: BoundingBox::new(0, 0, 50, 60),
            landmarks: vec![
                NativeLandmark {
                    landmark_type: 10,
                    position: Point { x: 30.0, y: 20.0 },
                },
                NativeLandmark {
                    landmark_type: 99,
                    position: Point { x: 1.0, y: 2.0 },
                },
            ],
            tracking_id: None,
        }]);
        let codes: Vec<i32> = faces[0].landmarks.iter().map(|l| l.type_code).collect();
        assert_eq!(codes, vec![10, 99]);
    }

    #[test]
    fn labels_are_not_thresholded() {
        let labels = map_labels(vec![label("Sky", 0.99), label("Kite", 0.01)]);
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[1].label, "Kite");
    }
}
