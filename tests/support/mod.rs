//! Scripted collaborators shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use time::OffsetDateTime;
use tokio::sync::Notify;
use uuid::Uuid;
use zackweg::application::ports::{ApiError, ImageUploader, ListingsApi, UploadError};
use zackweg::application::uploads::ProgressSink;
use zackweg_api_types::{ListingResponse, ListingWriteRequest};

/// A JPEG-looking payload distinguished by `tag`.
pub fn jpeg(tag: u8) -> Bytes {
    Bytes::from(vec![0xFF, 0xD8, 0xFF, 0xE0, tag])
}

pub enum Step {
    Succeed(String),
    Fail(UploadError),
    /// Report half progress, then succeed once the gate is notified.
    Gated(Arc<Notify>, String),
}

/// Uploader answering each payload from a per-payload queue of steps.
#[derive(Default)]
pub struct ScriptedUploader {
    scripts: Mutex<HashMap<Vec<u8>, VecDeque<Step>>>,
    calls: AtomicUsize,
}

impl ScriptedUploader {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script(&self, payload: &Bytes, steps: impl IntoIterator<Item = Step>) {
        self.scripts
            .lock()
            .expect("scripts lock")
            .entry(payload.to_vec())
            .or_default()
            .extend(steps);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageUploader for ScriptedUploader {
    async fn upload(&self, bytes: Bytes, progress: ProgressSink) -> Result<String, UploadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .scripts
            .lock()
            .expect("scripts lock")
            .get_mut(bytes.as_ref())
            .and_then(VecDeque::pop_front);

        match step {
            Some(Step::Succeed(url)) => {
                progress.report(1.0);
                Ok(url)
            }
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Gated(gate, url)) => {
                progress.report(0.5);
                gate.notified().await;
                Ok(url)
            }
            None => Err(UploadError::Transport("no scripted response".to_string())),
        }
    }
}

/// In-memory listings backend recording every write it receives.
#[derive(Default)]
pub struct RecordingListings {
    stored: Mutex<HashMap<Uuid, ListingResponse>>,
    writes: Mutex<Vec<ListingWriteRequest>>,
}

impl RecordingListings {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed(&self, listing: ListingResponse) {
        self.stored
            .lock()
            .expect("stored lock")
            .insert(listing.id, listing);
    }

    pub fn writes(&self) -> Vec<ListingWriteRequest> {
        self.writes.lock().expect("writes lock").clone()
    }

    fn store(&self, id: Uuid, request: &ListingWriteRequest) -> ListingResponse {
        self.writes.lock().expect("writes lock").push(request.clone());
        let listing = listing(id, request);
        self.stored
            .lock()
            .expect("stored lock")
            .insert(id, listing.clone());
        listing
    }
}

pub fn listing(id: Uuid, request: &ListingWriteRequest) -> ListingResponse {
    let now = OffsetDateTime::UNIX_EPOCH;
    ListingResponse {
        id,
        title: request.title.clone(),
        description: request.description.clone(),
        price_cents: request.price_cents,
        category: request.category.clone(),
        image_urls: request.image_urls.clone(),
        created_at: now,
        updated_at: now,
    }
}

#[async_trait]
impl ListingsApi for RecordingListings {
    async fn fetch(&self, id: Uuid) -> Result<ListingResponse, ApiError> {
        self.stored
            .lock()
            .expect("stored lock")
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::Server {
                status: 404,
                message: "Not Found".to_string(),
            })
    }

    async fn create(&self, request: &ListingWriteRequest) -> Result<ListingResponse, ApiError> {
        Ok(self.store(Uuid::new_v4(), request))
    }

    async fn update(
        &self,
        id: Uuid,
        request: &ListingWriteRequest,
    ) -> Result<ListingResponse, ApiError> {
        Ok(self.store(id, request))
    }
}
