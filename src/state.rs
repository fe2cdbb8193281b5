//! Result aggregator.
//!
//! `UiState` is never mutated in place. Every transition clones the current
//! snapshot, edits the copy and publishes it through a watch channel, so a
//! reader always holds some complete point-in-time state.
//!
//! Only one operation is expected in flight per session. Overlapping
//! operations are not serialized here.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::detect::{Barcode, DetectedFace, DetectedObject, ImageLabel, TextBlock};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct UiState {
    pub is_loading: bool,
    pub error: Option<String>,
    pub text_results: Vec<TextBlock>,
    pub object_results: Vec<DetectedObject>,
    pub barcode_results: Vec<Barcode>,
    pub face_results: Vec<DetectedFace>,
    pub label_results: Vec<ImageLabel>,
}

/// Receiver side handed to presentation code.
pub type StateWatcher = watch::Receiver<Arc<UiState>>;

pub struct ResultAggregator {
    sender: watch::Sender<Arc<UiState>>,
}

impl ResultAggregator {
    pub fn new() -> Self {
        let (sender, _rx) = watch::channel(Arc::new(UiState::default()));
        Self { sender }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<UiState> {
        self.sender.borrow().clone()
    }

    /// Subscribe to snapshots. The receiver yields on every transition.
    pub fn subscribe(&self) -> StateWatcher {
        self.sender.subscribe()
    }

    /// An operation is starting: loading, any previous error cleared.
    pub fn start(&self) {
        log::debug!("state: start");
        self.transition(|state| {
            state.is_loading = true;
            state.error = None;
        });
    }

    pub fn complete_text(&self, results: Vec<TextBlock>) {
        log::debug!("state: {} text results", results.len());
        self.transition(move |state| {
            state.text_results = results;
            finish_success(state);
        });
    }

    pub fn complete_objects(&self, results: Vec<DetectedObject>) {
        log::debug!("state: {} object results", results.len());
        self.transition(move |state| {
            state.object_results = results;
            finish_success(state);
        });
    }

    pub fn complete_barcodes(&self, results: Vec<Barcode>) {
        log::debug!("state: {} barcode results", results.len());
        self.transition(move |state| {
            state.barcode_results = results;
            finish_success(state);
        });
    }

    pub fn complete_faces(&self, results: Vec<DetectedFace>) {
        log::debug!("state: {} face results", results.len());
        self.transition(move |state| {
            state.face_results = results;
            finish_success(state);
        });
    }

    pub fn complete_labels(&self, results: Vec<ImageLabel>) {
        log::debug!("state: {} label results", results.len());
        self.transition(move |state| {
            state.label_results = results;
            finish_success(state);
        });
    }

    /// The operation failed. Result lists keep their previous values.
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("state: failed: {}", message);
        self.transition(move |state| {
            state.error = Some(message);
            state.is_loading = false;
        });
    }

    /// A pending operation was abandoned. Loading ends; results and error are
    /// left as they were.
    pub fn cancel(&self) {
        log::debug!("state: cancelled");
        self.transition(|state| state.is_loading = false);
    }

    /// Back to the initial, empty state.
    pub fn clear_results(&self) {
        log::debug!("state: clear results");
        self.sender.send_replace(Arc::new(UiState::default()));
    }

    pub fn clear_error(&self) {
        log::debug!("state: clear error");
        self.transition(|state| state.error = None);
    }

    /// Read, edit and publish under the channel lock so concurrent
    /// transitions cannot overwrite each other.
    fn transition(&self, apply: impl FnOnce(&mut UiState)) {
        self.sender.send_modify(|current| {
            let mut next = UiState::clone(current);
            apply(&mut next);
            *current = Arc::new(next);
        });
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

fn finish_success(state: &mut UiState) {
    state.is_loading = false;
    state.error = None;
}
