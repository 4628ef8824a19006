//! Image upload items, their per-item state and local validation rules.

use std::fmt;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::util::bytes::format_bytes;

/// Largest image accepted for upload unless configured otherwise (5 MiB).
pub const DEFAULT_MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// Content type sent with every image upload.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

const JPEG_SOI: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Opaque identifier assigned to an image when it is selected.
///
/// The identifier is generated once and follows the image through every
/// upload attempt until it is removed from the form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ImageId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ImageId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A locally selected image waiting to be (or being) uploaded.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub id: ImageId,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// Wrap freshly selected bytes under a newly generated identifier.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            id: ImageId::generate(),
            bytes: bytes.into(),
        }
    }
}

/// Upload state of a single image.
///
/// Transitions: `NotUploaded -> Uploading -> Uploaded | Failed`, and
/// `Failed -> Uploading` through a manual retry. `Uploaded` is terminal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum UploadState {
    NotUploaded,
    Uploading { progress: f32 },
    Uploaded { url: String },
    Failed { message: String },
}

impl UploadState {
    pub fn uploading() -> Self {
        Self::Uploading { progress: 0.0 }
    }

    #[must_use]
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }

    #[must_use]
    pub fn is_uploading(&self) -> bool {
        matches!(self, Self::Uploading { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Remote URL of an uploaded image.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Uploaded { url } => Some(url),
            _ => None,
        }
    }

    /// Short label for status lines next to a thumbnail.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotUploaded => "Ready",
            Self::Uploading { .. } => "Uploading…",
            Self::Uploaded { .. } => "Uploaded",
            Self::Failed { .. } => "Failed",
        }
    }
}

/// Reasons an image is rejected before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageValidationError {
    #[error("image is empty")]
    Empty,
    #[error("{}", too_large_message(*.size, *.limit))]
    TooLarge { size: u64, limit: u64 },
    #[error("image is not a decodable JPEG")]
    NotJpeg,
}

/// Rounded sizes unless they would read the same, then exact byte counts.
fn too_large_message(size: u64, limit: u64) -> String {
    let (size_text, limit_text) = (format_bytes(size), format_bytes(limit));
    if size_text == limit_text {
        format!("image is {size} bytes but the limit is {limit} bytes")
    } else {
        format!("image is {size_text} but the limit is {limit_text}")
    }
}

/// Local acceptance rules applied before an upload is dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageConstraints {
    pub max_bytes: u64,
}

impl Default for ImageConstraints {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_IMAGE_BYTES,
        }
    }
}

impl ImageConstraints {
    pub fn with_max_bytes(max_bytes: u64) -> Self {
        Self { max_bytes }
    }

    /// Check that `bytes` may be uploaded: non-empty, within the ceiling and
    /// starting with a JPEG start-of-image marker.
    pub fn validate(&self, bytes: &[u8]) -> Result<(), ImageValidationError> {
        if bytes.is_empty() {
            return Err(ImageValidationError::Empty);
        }

        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(ImageValidationError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        if !bytes.starts_with(&JPEG_SOI) {
            return Err(ImageValidationError::NotJpeg);
        }

        Ok(())
    }
}
