//! Traits describing the remote services the listing forms depend on.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use uuid::Uuid;
use zackweg_api_types::{ListingResponse, ListingWriteRequest};

use crate::application::uploads::ProgressSink;
use crate::domain::uploads::ImageValidationError;

/// Message used when the backend rejects an upload without an explanation.
pub const GENERIC_UPLOAD_FAILURE: &str = "Image upload failed";

/// Why a single image did not reach `Uploaded`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error(transparent)]
    Validation(#[from] ImageValidationError),
    #[error("{0}")]
    Transport(String),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("invalid upload response: {0}")]
    InvalidResponse(String),
}

impl UploadError {
    /// Build a rejection, falling back to [`GENERIC_UPLOAD_FAILURE`].
    pub fn rejected(status: u16, message: Option<String>) -> Self {
        Self::Rejected {
            status,
            message: message.unwrap_or_else(|| GENERIC_UPLOAD_FAILURE.to_string()),
        }
    }

    /// Stable label used for the `reason` metric dimension.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport(_) => "transport",
            Self::Rejected { .. } => "rejected",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

/// Sends one image to the backend and returns its remote URL.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    async fn upload(&self, bytes: Bytes, progress: ProgressSink) -> Result<String, UploadError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("server responded with status {status}: {message}")]
    Server { status: u16, message: String },
    #[error("invalid response body: {0}")]
    InvalidResponse(String),
}

/// Listing endpoints used by the create and edit forms.
#[async_trait]
pub trait ListingsApi: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<ListingResponse, ApiError>;

    async fn create(&self, request: &ListingWriteRequest) -> Result<ListingResponse, ApiError>;

    async fn update(
        &self,
        id: Uuid,
        request: &ListingWriteRequest,
    ) -> Result<ListingResponse, ApiError>;
}
