//! Loading locally selected images from disk.

use std::path::Path;

use bytes::Bytes;
use tokio::fs;

use super::error::InfraError;

/// Read an image file into memory. Validation happens in the orchestrator.
pub async fn read_image(path: &Path) -> Result<Bytes, InfraError> {
    let data = fs::read(path).await.map_err(|source| InfraError::ImageFile {
        path: path.display().to_string(),
        source,
    })?;
    Ok(Bytes::from(data))
}
