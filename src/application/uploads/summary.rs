use std::fmt;

use serde::Serialize;

/// Counts behind the "x of y uploaded" line shown under the thumbnails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UploadSummary {
    pub total: usize,
    pub uploaded: usize,
    pub uploading: usize,
    pub failed: usize,
}

impl UploadSummary {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.uploaded == self.total
    }
}

impl fmt::Display for UploadSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} uploaded, {} failed",
            self.uploaded, self.total, self.failed
        )
    }
}
