//! Per-form image upload orchestration.
//!
//! One orchestrator belongs to one create or edit form. Each accepted image
//! gets its own Tokio task; tasks never touch the registry directly and
//! instead report through a channel drained by the owner (`pump`,
//! `next_change`, `settle`). All registry mutation therefore happens through
//! `&mut self`, on whichever task owns the form.

use std::collections::HashMap;
use std::sync::Arc;

use bytes::Bytes;
use metrics::counter;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::events::{Attempt, CompletionGuard, ProgressSink, UploadEvent};
use super::registry::UploadRegistry;
use super::summary::UploadSummary;
use crate::application::ports::{ImageUploader, UploadError};
use crate::domain::uploads::{ImageConstraints, ImageId, ImageUpload, UploadState};

pub const METRIC_UPLOAD_STARTED: &str = "zackweg_image_upload_started_total";
pub const METRIC_UPLOAD_SUCCEEDED: &str = "zackweg_image_upload_succeeded_total";
pub const METRIC_UPLOAD_FAILED: &str = "zackweg_image_upload_failed_total";
pub const METRIC_UPLOAD_RETRIED: &str = "zackweg_image_upload_retried_total";

/// A state change applied to the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadChange {
    pub id: ImageId,
    pub state: UploadState,
}

pub struct UploadOrchestrator {
    uploader: Arc<dyn ImageUploader>,
    constraints: ImageConstraints,
    registry: UploadRegistry,
    tasks: HashMap<ImageId, JoinHandle<()>>,
    events_tx: UnboundedSender<UploadEvent>,
    events_rx: UnboundedReceiver<UploadEvent>,
}

impl UploadOrchestrator {
    pub fn new(uploader: Arc<dyn ImageUploader>, constraints: ImageConstraints) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            uploader,
            constraints,
            registry: UploadRegistry::new(),
            tasks: HashMap::new(),
            events_tx,
            events_rx,
        }
    }

    /// Register `id` as uploading and dispatch exactly one upload for it.
    ///
    /// Bytes failing local validation are recorded as `Failed` without any
    /// network call. Must be called from within a Tokio runtime.
    pub fn add_and_upload(&mut self, id: ImageId, bytes: Bytes) {
        self.cancel_task(&id);

        if let Err(err) = self.constraints.validate(&bytes) {
            let err = UploadError::from(err);
            warn!(
                image_id = %id,
                size_bytes = bytes.len(),
                error = %err,
                "image rejected before upload"
            );
            counter!(METRIC_UPLOAD_FAILED, "reason" => err.reason()).increment(1);
            self.registry.reject(id, bytes, err.to_string());
            return;
        }

        let attempt = self.registry.begin(id.clone(), bytes.clone());
        self.dispatch(id, attempt, bytes);
    }

    /// Convenience wrapper over [`Self::add_and_upload`] returning the identifier.
    pub fn add(&mut self, upload: ImageUpload) -> ImageId {
        let id = upload.id.clone();
        self.add_and_upload(upload.id, upload.bytes);
        id
    }

    /// Register an image that is already on the server, e.g. when editing.
    pub fn adopt_uploaded(&mut self, id: ImageId, url: String) {
        self.cancel_task(&id);
        self.registry.adopt(id, url);
    }

    /// Remove `id`, cancelling its upload. Unknown identifiers are ignored.
    pub fn remove_item(&mut self, id: &ImageId) {
        self.cancel_task(id);
        if let Some(previous) = self.registry.remove(id) {
            debug!(image_id = %id, status = previous.label(), "image removed");
        }
    }

    /// Re-dispatch a failed upload. Returns `false` (leaving the state
    /// untouched) unless `id` is currently `Failed`.
    pub fn retry(&mut self, id: &ImageId) -> bool {
        let Some(payload) = self.registry.failed_payload(id) else {
            debug!(image_id = %id, "retry ignored: image is not in a failed state");
            return false;
        };

        if let Err(err) = self.constraints.validate(&payload) {
            debug!(image_id = %id, error = %err, "retry ignored: image still fails validation");
            return false;
        }

        let Some(attempt) = self.registry.restart(id) else {
            return false;
        };
        counter!(METRIC_UPLOAD_RETRIED).increment(1);
        self.dispatch(id.clone(), attempt, payload);
        true
    }

    /// Retry every failed image; returns how many were re-dispatched.
    pub fn retry_failed(&mut self) -> usize {
        let mut dispatched = 0;
        for id in self.registry.failed_ids() {
            if self.retry(&id) {
                dispatched += 1;
            }
        }
        dispatched
    }

    /// Whether every registered image is uploaded (true when none are).
    #[must_use]
    pub fn all_uploaded(&self) -> bool {
        self.registry.all_uploaded()
    }

    /// Forget every image and URL, cancelling in-flight uploads.
    pub fn reset(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
        self.registry.clear();
        while self.events_rx.try_recv().is_ok() {}
    }

    pub fn state(&self, id: &ImageId) -> Option<&UploadState> {
        self.registry.state(id)
    }

    /// Remote URLs of uploaded images, in completion order.
    pub fn uploaded_urls(&self) -> &[String] {
        self.registry.urls()
    }

    /// Identifier of the uploaded image stored at `url`.
    pub fn uploaded_id(&self, url: &str) -> Option<ImageId> {
        self.registry.id_for_url(url).cloned()
    }

    pub fn failed_ids(&self) -> Vec<ImageId> {
        self.registry.failed_ids()
    }

    pub fn summary(&self) -> UploadSummary {
        self.registry.summary()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    /// Apply every report already received without waiting.
    pub fn pump(&mut self) -> Vec<UploadChange> {
        let mut changes = Vec::new();
        while let Ok(event) = self.events_rx.try_recv() {
            if let Some(change) = self.apply(event) {
                changes.push(change);
            }
        }
        changes
    }

    /// Wait for the next report that changes the registry.
    ///
    /// Returns `None` immediately when nothing is uploading.
    pub async fn next_change(&mut self) -> Option<UploadChange> {
        while self.registry.has_uploading() {
            let event = self.events_rx.recv().await?;
            if let Some(change) = self.apply(event) {
                return Some(change);
            }
        }
        None
    }

    /// Wait until no image is uploading.
    pub async fn settle(&mut self) {
        while self.next_change().await.is_some() {}
    }

    fn dispatch(&mut self, id: ImageId, attempt: Attempt, bytes: Bytes) {
        info!(
            image_id = %id,
            attempt = attempt.get(),
            size_bytes = bytes.len(),
            "image upload dispatched"
        );
        counter!(METRIC_UPLOAD_STARTED).increment(1);

        let uploader = Arc::clone(&self.uploader);
        let progress = ProgressSink::new(id.clone(), attempt, self.events_tx.clone());
        let guard = CompletionGuard::new(id.clone(), attempt, self.events_tx.clone());
        let task = tokio::spawn(async move {
            let outcome = uploader.upload(bytes, progress).await;
            guard.finish(outcome);
        });

        if let Some(previous) = self.tasks.insert(id, task) {
            previous.abort();
        }
    }

    fn apply(&mut self, event: UploadEvent) -> Option<UploadChange> {
        match event {
            UploadEvent::Progress {
                id,
                attempt,
                fraction,
            } => {
                let state = self.registry.progress(&id, attempt, fraction)?;
                Some(UploadChange { id, state })
            }
            UploadEvent::Finished {
                id,
                attempt,
                outcome,
            } => self.apply_finished(id, attempt, outcome),
        }
    }

    fn apply_finished(
        &mut self,
        id: ImageId,
        attempt: Attempt,
        outcome: Result<String, UploadError>,
    ) -> Option<UploadChange> {
        let reason = outcome.as_ref().err().map(UploadError::reason);
        let Some(state) = self
            .registry
            .finish(&id, attempt, outcome.map_err(|err| err.to_string()))
        else {
            debug!(image_id = %id, attempt = attempt.get(), "stale upload report discarded");
            return None;
        };
        self.tasks.remove(&id);

        match (&state, reason) {
            (UploadState::Uploaded { url }, _) => {
                info!(image_id = %id, attempt = attempt.get(), url = %url, "image uploaded");
                counter!(METRIC_UPLOAD_SUCCEEDED).increment(1);
            }
            (UploadState::Failed { message }, reason) => {
                let reason = reason.unwrap_or("transport");
                warn!(
                    image_id = %id,
                    attempt = attempt.get(),
                    reason,
                    error = %message,
                    "image upload failed"
                );
                counter!(METRIC_UPLOAD_FAILED, "reason" => reason).increment(1);
            }
            _ => {}
        }

        Some(UploadChange { id, state })
    }

    fn cancel_task(&mut self, id: &ImageId) {
        if let Some(task) = self.tasks.remove(id) {
            task.abort();
        }
    }
}

impl Drop for UploadOrchestrator {
    fn drop(&mut self) {
        for (_, task) in self.tasks.drain() {
            task.abort();
        }
    }
}

impl std::fmt::Debug for UploadOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadOrchestrator")
            .field("constraints", &self.constraints)
            .field("registry", &self.registry)
            .field("in_flight", &self.tasks.len())
            .finish_non_exhaustive()
    }
}
