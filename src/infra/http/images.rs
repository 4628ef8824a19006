use std::num::NonZeroUsize;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Body, Method, StatusCode};
use tracing::debug;
use zackweg_api_types::ImageUploadResponse;

use super::client::{ApiClient, describe, error_message};
use crate::application::ports::{ImageUploader, UploadError};
use crate::application::uploads::ProgressSink;
use crate::domain::uploads::IMAGE_CONTENT_TYPE;

pub const IMAGE_UPLOAD_PATH: &str = "images/upload";
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

/// Uploads raw JPEG bodies to `POST {base}/images/upload`.
#[derive(Clone, Debug)]
pub struct HttpImageUploader {
    api: ApiClient,
    chunk_bytes: NonZeroUsize,
}

impl HttpImageUploader {
    pub fn new(api: ApiClient, chunk_bytes: NonZeroUsize) -> Self {
        Self { api, chunk_bytes }
    }

    fn body(&self, bytes: Bytes, progress: ProgressSink) -> Body {
        let total = bytes.len();
        let chunks = chunked(bytes, self.chunk_bytes.get());
        let mut sent = 0usize;
        let stream = stream::iter(chunks).map(move |chunk| {
            sent += chunk.len();
            if total > 0 {
                progress.report(sent as f32 / total as f32);
            }
            Ok::<Bytes, std::io::Error>(chunk)
        });
        Body::wrap_stream(stream)
    }
}

#[async_trait]
impl ImageUploader for HttpImageUploader {
    async fn upload(&self, bytes: Bytes, progress: ProgressSink) -> Result<String, UploadError> {
        let url = self
            .api
            .url(IMAGE_UPLOAD_PATH)
            .map_err(|err| UploadError::Transport(format!("invalid upload URL: {err}")))?;
        let size = bytes.len();

        let response = self
            .api
            .request(Method::POST, url)
            .header(CONTENT_TYPE, IMAGE_CONTENT_TYPE)
            .header(CONTENT_LENGTH, size)
            .body(self.body(bytes, progress))
            .send()
            .await
            .map_err(|err| UploadError::Transport(describe(&err)))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| UploadError::Transport(describe(&err)))?;
        debug!(status = status.as_u16(), size_bytes = size, "upload response received");

        if !matches!(status, StatusCode::OK | StatusCode::CREATED) {
            return Err(UploadError::rejected(status.as_u16(), error_message(&body)));
        }

        let decoded: ImageUploadResponse = serde_json::from_slice(&body)
            .map_err(|err| UploadError::InvalidResponse(err.to_string()))?;
        if decoded.url.trim().is_empty() {
            return Err(UploadError::InvalidResponse("missing image url".to_string()));
        }
        Ok(decoded.url)
    }
}

fn chunked(bytes: Bytes, chunk_bytes: usize) -> Vec<Bytes> {
    let mut chunks = Vec::with_capacity(bytes.len().div_ceil(chunk_bytes));
    let mut offset = 0;
    while offset < bytes.len() {
        let end = (offset + chunk_bytes).min(bytes.len());
        chunks.push(bytes.slice(offset..end));
        offset = end;
    }
    chunks
}
