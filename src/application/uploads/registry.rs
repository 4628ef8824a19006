//! Keyed upload state for one form plus the list of uploaded URLs.
//!
//! The registry is plain data: it never performs I/O. Every mutation that
//! originates from an upload task is checked against the entry's current
//! [`Attempt`], which is how late reports for removed, replaced or reset
//! entries are discarded.

use std::collections::HashMap;

use bytes::Bytes;

use super::events::Attempt;
use super::summary::UploadSummary;
use crate::domain::uploads::{ImageId, UploadState};

#[derive(Debug)]
struct Entry {
    state: UploadState,
    /// Set while a dispatch is outstanding.
    attempt: Option<Attempt>,
    /// Retained until the image is uploaded so a retry can resend it.
    payload: Option<Bytes>,
}

#[derive(Debug, Default)]
pub struct UploadRegistry {
    entries: HashMap<ImageId, Entry>,
    urls: Vec<String>,
    last_attempt: u64,
}

impl UploadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `id` as uploading, replacing any previous entry.
    pub fn begin(&mut self, id: ImageId, payload: Bytes) -> Attempt {
        self.remove(&id);
        let attempt = self.next_attempt();
        self.entries.insert(
            id,
            Entry {
                state: UploadState::uploading(),
                attempt: Some(attempt),
                payload: Some(payload),
            },
        );
        attempt
    }

    /// Register `id` as failed without dispatching anything.
    pub fn reject(&mut self, id: ImageId, payload: Bytes, message: String) {
        self.remove(&id);
        self.entries.insert(
            id,
            Entry {
                state: UploadState::Failed { message },
                attempt: None,
                payload: Some(payload),
            },
        );
    }

    /// Register an image that already lives on the server.
    pub fn adopt(&mut self, id: ImageId, url: String) {
        self.remove(&id);
        self.urls.push(url.clone());
        self.entries.insert(
            id,
            Entry {
                state: UploadState::Uploaded { url },
                attempt: None,
                payload: None,
            },
        );
    }

    /// Payload of a failed entry, if `id` is currently failed.
    pub fn failed_payload(&self, id: &ImageId) -> Option<Bytes> {
        self.entries
            .get(id)
            .filter(|entry| entry.state.is_failed())
            .and_then(|entry| entry.payload.clone())
    }

    /// Move a failed entry back to uploading under a new attempt.
    pub fn restart(&mut self, id: &ImageId) -> Option<Attempt> {
        let failed_with_payload = self
            .entries
            .get(id)
            .is_some_and(|entry| entry.state.is_failed() && entry.payload.is_some());
        if !failed_with_payload {
            return None;
        }

        let attempt = self.next_attempt();
        let entry = self.entries.get_mut(id)?;
        entry.state = UploadState::uploading();
        entry.attempt = Some(attempt);
        Some(attempt)
    }

    /// Record upload progress; returns the new state when the report is current.
    pub fn progress(
        &mut self,
        id: &ImageId,
        attempt: Attempt,
        fraction: f32,
    ) -> Option<UploadState> {
        let entry = self.current_entry(id, attempt)?;
        let UploadState::Uploading { progress } = &mut entry.state else {
            return None;
        };
        *progress = progress.max(fraction);
        Some(entry.state.clone())
    }

    /// Record the outcome of an attempt; returns the new state when the
    /// report is current, `None` when it is stale.
    pub fn finish(
        &mut self,
        id: &ImageId,
        attempt: Attempt,
        outcome: Result<String, String>,
    ) -> Option<UploadState> {
        let entry = self.current_entry(id, attempt)?;
        if !entry.state.is_uploading() {
            return None;
        }

        entry.attempt = None;
        match outcome {
            Ok(url) => {
                entry.payload = None;
                entry.state = UploadState::Uploaded { url: url.clone() };
                let state = entry.state.clone();
                self.urls.push(url);
                Some(state)
            }
            Err(message) => {
                entry.state = UploadState::Failed { message };
                Some(entry.state.clone())
            }
        }
    }

    /// Drop `id`; an uploaded URL leaves the result list with it.
    pub fn remove(&mut self, id: &ImageId) -> Option<UploadState> {
        let entry = self.entries.remove(id)?;
        if let UploadState::Uploaded { url } = &entry.state
            && let Some(position) = self.urls.iter().position(|candidate| candidate == url)
        {
            self.urls.remove(position);
        }
        Some(entry.state)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.urls.clear();
    }

    pub fn state(&self, id: &ImageId) -> Option<&UploadState> {
        self.entries.get(id).map(|entry| &entry.state)
    }

    /// Every entry is uploaded; vacuously true when empty.
    #[must_use]
    pub fn all_uploaded(&self) -> bool {
        self.entries.values().all(|entry| entry.state.is_uploaded())
    }

    #[must_use]
    pub fn has_uploading(&self) -> bool {
        self.entries.values().any(|entry| entry.state.is_uploading())
    }

    /// Uploaded URLs in completion order.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Identifier of the uploaded entry whose remote URL is `url`.
    pub fn id_for_url(&self, url: &str) -> Option<&ImageId> {
        self.entries
            .iter()
            .find(|(_, entry)| entry.state.url() == Some(url))
            .map(|(id, _)| id)
    }

    /// Identifiers currently failed, sorted for stable output.
    pub fn failed_ids(&self) -> Vec<ImageId> {
        let mut ids: Vec<ImageId> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.state.is_failed())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    pub fn summary(&self) -> UploadSummary {
        self.entries
            .values()
            .fold(UploadSummary::default(), |mut summary, entry| {
                summary.total += 1;
                match entry.state {
                    UploadState::Uploaded { .. } => summary.uploaded += 1,
                    UploadState::Uploading { .. } => summary.uploading += 1,
                    UploadState::Failed { .. } => summary.failed += 1,
                    UploadState::NotUploaded => {}
                }
                summary
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_attempt(&mut self) -> Attempt {
        self.last_attempt += 1;
        Attempt(self.last_attempt)
    }

    fn current_entry(&mut self, id: &ImageId, attempt: Attempt) -> Option<&mut Entry> {
        self.entries
            .get_mut(id)
            .filter(|entry| entry.attempt == Some(attempt))
    }
}
