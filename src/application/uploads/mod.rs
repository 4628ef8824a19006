//! Image upload orchestration for the listing forms.

mod events;
mod orchestrator;
mod registry;
mod summary;

pub use events::ProgressSink;
pub use orchestrator::{
    METRIC_UPLOAD_FAILED, METRIC_UPLOAD_RETRIED, METRIC_UPLOAD_STARTED, METRIC_UPLOAD_SUCCEEDED,
    UploadChange, UploadOrchestrator,
};
pub use summary::UploadSummary;
