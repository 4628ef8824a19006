//! reqwest adapters for the listings backend.

mod client;
mod images;
mod listings;

pub use client::ApiClient;
pub use images::{DEFAULT_CHUNK_BYTES, HttpImageUploader, IMAGE_UPLOAD_PATH};
pub use listings::HttpListingsApi;
