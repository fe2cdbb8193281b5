//! A screen's vision session: one aggregator, one repository, and the tasks
//! launched on their behalf.

use anyhow::{anyhow, Result};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::adapter::VisionRepository;
use crate::detect::{DetectionKind, NativeError};
use crate::frame::VisionImage;
use crate::state::{ResultAggregator, StateWatcher, UiState};

pub struct VisionSession {
    aggregator: Arc<ResultAggregator>,
    repository: Arc<dyn VisionRepository>,
    pending: Mutex<Vec<JoinHandle<()>>>,
}

impl VisionSession {
    pub fn new(repository: Arc<dyn VisionRepository>) -> Self {
        Self {
            aggregator: Arc::new(ResultAggregator::new()),
            repository,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn state(&self) -> Arc<UiState> {
        self.aggregator.snapshot()
    }

    pub fn subscribe(&self) -> StateWatcher {
        self.aggregator.subscribe()
    }

    /// Run one detection to completion and return the resulting snapshot.
    pub async fn run(&self, kind: DetectionKind, image: VisionImage) -> Arc<UiState> {
        drive(&self.aggregator, self.repository.as_ref(), kind, image).await;
        self.aggregator.snapshot()
    }

    /// Spawn a detection on the current tokio runtime.
    ///
    /// The task is owned by this session and is aborted by `cancel_pending`
    /// or when the session is dropped.
    pub fn launch(&self, kind: DetectionKind, image: VisionImage) -> Result<()> {
        let handle = Handle::try_current()
            .map_err(|_| anyhow!("launching {} requires a tokio runtime", kind))?;
        let aggregator = self.aggregator.clone();
        let repository = self.repository.clone();
        let task = handle.spawn(async move {
            drive(&aggregator, repository.as_ref(), kind, image).await;
        });

        let mut pending = self
            .pending
            .lock()
            .map_err(|_| anyhow!("session task list lock poisoned"))?;
        pending.retain(|task| !task.is_finished());
        pending.push(task);
        Ok(())
    }

    /// Abort launched tasks that have not finished. Returns how many were
    /// aborted.
    ///
    /// The native call behind an aborted task runs on and its result is
    /// discarded. Loading ends so a new capture can start; result lists and
    /// any error are left as they were.
    pub fn cancel_pending(&self) -> usize {
        let tasks = match self.pending.lock() {
            Ok(mut pending) => std::mem::take(&mut *pending),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        };
        let mut aborted = 0;
        for task in tasks {
            if !task.is_finished() {
                task.abort();
                aborted += 1;
            }
        }
        if aborted > 0 {
            log::info!("session: cancelled {} pending detection(s)", aborted);
            self.aggregator.cancel();
        }
        aborted
    }

    pub fn clear_results(&self) {
        self.aggregator.clear_results();
    }

    pub fn clear_error(&self) {
        self.aggregator.clear_error();
    }
}

impl Drop for VisionSession {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

async fn drive(
    aggregator: &ResultAggregator,
    repository: &dyn VisionRepository,
    kind: DetectionKind,
    image: VisionImage,
) {
    log::info!("starting {}", kind);
    aggregator.start();
    match kind {
        DetectionKind::Text => settle(
            aggregator,
            kind,
            repository.recognize_text(image).await,
            ResultAggregator::complete_text,
        ),
        DetectionKind::Object => settle(
            aggregator,
            kind,
            repository.detect_objects(image).await,
            ResultAggregator::complete_objects,
        ),
        DetectionKind::Barcode => settle(
            aggregator,
            kind,
            repository.scan_barcodes(image).await,
            ResultAggregator::complete_barcodes,
        ),
        DetectionKind::Face => settle(
            aggregator,
            kind,
            repository.detect_faces(image).await,
            ResultAggregator::complete_faces,
        ),
        DetectionKind::Label => settle(
            aggregator,
            kind,
            repository.label_image(image).await,
            ResultAggregator::complete_labels,
        ),
    }
}

fn settle<R>(
    aggregator: &ResultAggregator,
    kind: DetectionKind,
    outcome: Result<Vec<R>, NativeError>,
    complete: fn(&ResultAggregator, Vec<R>),
) {
    match outcome {
        Ok(results) => {
            log::info!("{} completed with {} results", kind, results.len());
            complete(aggregator, results);
        }
        Err(e) => {
            let message = e
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| kind.failure_message());
            aggregator.fail(message);
        }
    }
}
