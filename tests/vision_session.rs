//! End-to-end runs of a vision session over scripted providers.
//!
//! These tests verify that:
//! 1. Native detections reach the matching result list, one result per detection
//! 2. Failures keep earlier results and report a message (or a per-feature fallback)
//! 3. Every request builds its own client
//! 4. Cancelled runs discard late completions

use std::collections::VecDeque;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use capture_vision::adapter::TEXT_CONFIDENCE;
use capture_vision::detect::options::{ClientOptions, TextRecognizerOptions};
use capture_vision::detect::{
    Completion, NativeBarcode, NativeClient, NativeFace, NativeLabel, NativeObject,
    NativeTextBlock, StubOutcome, StubProvider, StubScript,
};
use capture_vision::{
    can_capture, BoundingBox, DetectionKind, NativeError, ProviderRegistry, VisionAdapter, VisionImage,
    VisionProvider, VisionRepository, VisionSession,
};

fn photo() -> VisionImage {
    VisionImage::from_rgba(image::RgbaImage::new(8, 6))
}

fn text_block(text: &str) -> NativeTextBlock {
    NativeTextBlock {
        text: text.to_string(),
        bounding_box: None,
    }
}

fn stub_session(script: StubScript) -> VisionSession {
    VisionSession::new(Arc::new(VisionAdapter::with_provider(StubProvider::new(
        script,
    ))))
}

/// Text provider that answers each request with the next queued outcome.
struct SequencedText {
    replies: Mutex<VecDeque<Result<Vec<NativeTextBlock>, NativeError>>>,
}

impl SequencedText {
    fn new(replies: Vec<Result<Vec<NativeTextBlock>, NativeError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }
}

struct QueuedReply(Result<Vec<NativeTextBlock>, NativeError>);

impl NativeClient<NativeTextBlock> for QueuedReply {
    fn process(&self, _image: VisionImage, completion: Completion<NativeTextBlock>) {
        completion(self.0.clone());
    }
}

impl VisionProvider for SequencedText {
    fn name(&self) -> &'static str {
        "sequenced"
    }

    fn supports(&self, kind: DetectionKind) -> bool {
        kind == DetectionKind::Text
    }

    fn text_recognizer(
        &self,
        _options: &TextRecognizerOptions,
    ) -> Result<Box<dyn NativeClient<NativeTextBlock>>, NativeError> {
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("a reply is queued for every request");
        Ok(Box::new(QueuedReply(reply)))
    }
}

#[tokio::test]
async fn text_blocks_arrive_in_native_order() {
    let session = stub_session(StubScript {
        text: Some(StubOutcome::Detections(vec![
            text_block("A"),
            text_block("B"),
            text_block("C"),
        ])),
        ..StubScript::default()
    });

    let state = session.run(DetectionKind::Text, photo()).await;

    assert!(!state.is_loading);
    assert_eq!(state.error, None);
    let texts: Vec<&str> = state.text_results.iter().map(|b| b.text.as_str()).collect();
    assert_eq!(texts, vec!["A", "B", "C"]);
    assert!(state
        .text_results
        .iter()
        .all(|b| b.confidence == TEXT_CONFIDENCE));
}

#[tokio::test]
async fn failure_keeps_previous_results() {
    let provider = SequencedText::new(vec![
        Ok(vec![text_block("A"), text_block("B")]),
        Err(NativeError::new("native failure")),
    ]);
    let session = VisionSession::new(Arc::new(VisionAdapter::with_provider(provider)));

    let first = session.run(DetectionKind::Text, photo()).await;
    let second = session.run(DetectionKind::Text, photo()).await;

    assert!(!second.is_loading);
    assert_eq!(second.error.as_deref(), Some("native failure"));
    assert_eq!(second.text_results, first.text_results);
}

#[tokio::test]
async fn silent_failure_names_the_feature() {
    let session = stub_session(StubScript {
        text: Some(StubOutcome::Failure(None)),
        labels: Some(StubOutcome::Failure(None)),
        ..StubScript::default()
    });

    let state = session.run(DetectionKind::Text, photo()).await;
    assert_eq!(state.error.as_deref(), Some("Text recognition failed"));

    let state = session.run(DetectionKind::Label, photo()).await;
    assert_eq!(state.error.as_deref(), Some("Image labeling failed"));
}

#[tokio::test]
async fn empty_native_message_is_reported_as_given() {
    let session = stub_session(StubScript {
        barcodes: Some(StubOutcome::Failure(Some(String::new()))),
        ..StubScript::default()
    });

    let state = session.run(DetectionKind::Barcode, photo()).await;
    assert_eq!(state.error.as_deref(), Some(""));
    assert!(!state.is_loading);
}

#[tokio::test]
async fn new_run_clears_previous_error() {
    let provider = SequencedText::new(vec![
        Err(NativeError::new("blurry")),
        Ok(vec![text_block("sharp")]),
    ]);
    let session = VisionSession::new(Arc::new(VisionAdapter::with_provider(provider)));

    assert!(session.run(DetectionKind::Text, photo()).await.error.is_some());
    let state = session.run(DetectionKind::Text, photo()).await;
    assert_eq!(state.error, None);
    assert_eq!(state.text_results.len(), 1);
}

#[tokio::test]
async fn each_feature_updates_only_its_own_list() {
    let session = stub_session(StubScript {
        labels: Some(StubOutcome::Detections(vec![NativeLabel {
            text: "Dog".into(),
            confidence: 0.91,
            index: 3,
        }])),
        barcodes: Some(StubOutcome::Detections(vec![NativeBarcode {
            raw_value: None,
            format: 0x0100,
            bounding_box: None,
        }])),
        ..StubScript::default()
    });

    session.run(DetectionKind::Label, photo()).await;
    let state = session.run(DetectionKind::Barcode, photo()).await;

    assert_eq!(state.label_results.len(), 1);
    assert_eq!(state.label_results[0].label, "Dog");
    assert_eq!(state.barcode_results.len(), 1);
    assert_eq!(state.barcode_results[0].raw_value, "");
    assert!(state.text_results.is_empty());
}

#[tokio::test]
async fn result_count_matches_native_count() {
    let objects: Vec<NativeObject> = (0..4)
        .map(|i| NativeObject {
            labels: vec![],
            bounding_box: BoundingBox::new(i, i, i + 10, i + 10),
            tracking_id: Some(i),
        })
        .collect();
    let session = stub_session(StubScript {
        objects: Some(StubOutcome::Detections(objects)),
        ..StubScript::default()
    });

    let state = session.run(DetectionKind::Object, photo()).await;

    assert_eq!(state.object_results.len(), 4);
    assert!(state.object_results.iter().all(|o| o.label == "Unknown"));
    assert!(state.object_results.iter().all(|o| o.confidence == 0.0));
}

#[tokio::test]
async fn face_tracking_ids_follow_detector_options() {
    let faces = vec![NativeFace {
        bounding_box: BoundingBox::new(10, 10, 90, 110),
        landmarks: vec![],
        tracking_id: Some(7),
    }];
    let script = StubScript {
        faces: Some(StubOutcome::Detections(faces)),
        ..StubScript::default()
    };

    let untracked = stub_session(script.clone())
        .run(DetectionKind::Face, photo())
        .await;
    assert_eq!(untracked.face_results[0].tracking_id, None);

    let mut options = ClientOptions::default();
    options.faces.tracking = true;
    let mut registry = ProviderRegistry::new();
    registry.register(StubProvider::new(script));
    let tracked = VisionSession::new(Arc::new(VisionAdapter::new(Arc::new(registry), options)))
        .run(DetectionKind::Face, photo())
        .await;
    assert_eq!(tracked.face_results[0].tracking_id, Some(7));
}

#[tokio::test]
async fn unsupported_feature_reports_error() {
    let session = stub_session(StubScript::default());

    let state = session.run(DetectionKind::Object, photo()).await;

    assert!(!state.is_loading);
    let error = state.error.as_deref().unwrap();
    assert!(error.contains("Object detection"), "{error}");
}

#[tokio::test]
async fn dropped_completion_surfaces_as_error() {
    let session = stub_session(StubScript {
        text: Some(StubOutcome::Dropped),
        ..StubScript::default()
    });

    let state = session.run(DetectionKind::Text, photo()).await;

    assert!(!state.is_loading);
    assert_eq!(
        state.error.as_deref(),
        Some("vision client dropped its completion")
    );
}

#[tokio::test]
async fn every_request_builds_a_fresh_client() {
    let provider = StubProvider::new(StubScript {
        text: Some(StubOutcome::Detections(vec![text_block("x")])),
        ..StubScript::default()
    });
    let built = provider.clients_built();
    let adapter = VisionAdapter::with_provider(provider);

    for _ in 0..3 {
        adapter.recognize_text(photo()).await.unwrap();
    }
    assert_eq!(built.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn repository_detect_returns_tagged_results() {
    let adapter = VisionAdapter::with_provider(StubProvider::new(StubScript {
        labels: Some(StubOutcome::Detections(vec![NativeLabel {
            text: "Sky".into(),
            confidence: 0.5,
            index: 0,
        }])),
        ..StubScript::default()
    }));

    let results = adapter.detect(DetectionKind::Label, photo()).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].kind(), DetectionKind::Label);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_run_discards_late_completion() {
    let session = stub_session(StubScript {
        text: Some(StubOutcome::Detections(vec![text_block("late")])),
        delay_ms: 200,
        ..StubScript::default()
    });
    let mut watcher = session.subscribe();

    session.launch(DetectionKind::Text, photo()).unwrap();
    watcher.changed().await.unwrap();
    assert!(watcher.borrow_and_update().is_loading);

    assert_eq!(session.cancel_pending(), 1);
    assert!(watcher.has_changed().unwrap());
    assert!(!watcher.borrow_and_update().is_loading);
    tokio::time::sleep(Duration::from_millis(400)).await;

    let state = session.state();
    assert!(!state.is_loading);
    assert!(state.text_results.is_empty());
    assert!(can_capture(&state));
    assert!(!watcher.has_changed().unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn capture_resumes_after_cancel() {
    let session = stub_session(StubScript {
        text: Some(StubOutcome::Detections(vec![text_block("again")])),
        delay_ms: 100,
        ..StubScript::default()
    });
    let mut watcher = session.subscribe();

    session.launch(DetectionKind::Text, photo()).unwrap();
    watcher.changed().await.unwrap();
    session.cancel_pending();
    assert!(can_capture(&session.state()));

    let state = session.run(DetectionKind::Text, photo()).await;
    assert!(!state.is_loading);
    assert_eq!(state.text_results[0].text, "again");
}

#[tokio::test]
async fn launched_run_publishes_results() {
    let session = stub_session(StubScript {
        text: Some(StubOutcome::Detections(vec![text_block("hello")])),
        ..StubScript::default()
    });
    let mut watcher = session.subscribe();

    session.launch(DetectionKind::Text, photo()).unwrap();
    let state = loop {
        watcher.changed().await.unwrap();
        let state = watcher.borrow_and_update().clone();
        if !state.is_loading {
            break state;
        }
    };

    assert_eq!(state.text_results[0].text, "hello");
}

#[test]
fn launch_without_runtime_is_rejected() {
    let session = stub_session(StubScript::default());
    assert!(session.launch(DetectionKind::Text, photo()).is_err());
}

#[test]
fn stub_script_parses_from_json() {
    let script: StubScript = serde_json::from_str(
        r#"{
            "text": {"detections": [{"text": "EXIT"}]},
            "barcodes": {"failure": "lens covered"},
            "faces": "dropped",
            "delay_ms": 5
        }"#,
    )
    .unwrap();
    assert!(matches!(script.text, Some(StubOutcome::Detections(ref b)) if b.len() == 1));
    assert!(matches!(
        script.barcodes,
        Some(StubOutcome::Failure(Some(ref m))) if m == "lens covered"
    ));
    assert!(matches!(script.faces, Some(StubOutcome::Dropped)));
    assert_eq!(script.delay_ms, 5);
}
