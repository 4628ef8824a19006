//! Reports sent from upload tasks back to the orchestrator that owns them.

use tokio::sync::mpsc::UnboundedSender;

use crate::application::ports::UploadError;
use crate::domain::uploads::ImageId;

/// Token identifying one dispatch of an upload.
///
/// Tokens are handed out by the registry in strictly increasing order, so a
/// report carrying anything but the entry's current token is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Attempt(pub(super) u64);

impl Attempt {
    pub fn get(self) -> u64 {
        self.0
    }
}

#[derive(Debug)]
pub enum UploadEvent {
    Progress {
        id: ImageId,
        attempt: Attempt,
        fraction: f32,
    },
    Finished {
        id: ImageId,
        attempt: Attempt,
        outcome: Result<String, UploadError>,
    },
}

/// Handle given to an [`ImageUploader`](crate::application::ports::ImageUploader)
/// for reporting how much of the body has been sent.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    target: Option<(ImageId, Attempt, UnboundedSender<UploadEvent>)>,
}

impl ProgressSink {
    pub(super) fn new(id: ImageId, attempt: Attempt, tx: UnboundedSender<UploadEvent>) -> Self {
        Self {
            target: Some((id, attempt, tx)),
        }
    }

    /// A sink that discards every report.
    pub fn detached() -> Self {
        Self { target: None }
    }

    /// Report progress as a fraction of the body sent, clamped to `0.0..=1.0`.
    pub fn report(&self, fraction: f32) {
        if !fraction.is_finite() {
            return;
        }
        if let Some((id, attempt, tx)) = &self.target {
            // The receiver is gone once the form is dismissed.
            let _ = tx.send(UploadEvent::Progress {
                id: id.clone(),
                attempt: *attempt,
                fraction: fraction.clamp(0.0, 1.0),
            });
        }
    }
}

/// Delivers exactly one `Finished` report per dispatch.
///
/// If the task is aborted or unwinds before [`CompletionGuard::finish`] runs,
/// the drop path reports a failure instead.
pub(super) struct CompletionGuard {
    id: ImageId,
    attempt: Attempt,
    tx: UnboundedSender<UploadEvent>,
    delivered: bool,
}

impl CompletionGuard {
    pub(super) fn new(id: ImageId, attempt: Attempt, tx: UnboundedSender<UploadEvent>) -> Self {
        Self {
            id,
            attempt,
            tx,
            delivered: false,
        }
    }

    pub(super) fn finish(mut self, outcome: Result<String, UploadError>) {
        self.deliver(outcome);
    }

    fn deliver(&mut self, outcome: Result<String, UploadError>) {
        self.delivered = true;
        let _ = self.tx.send(UploadEvent::Finished {
            id: self.id.clone(),
            attempt: self.attempt,
            outcome,
        });
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        if !self.delivered {
            self.deliver(Err(UploadError::Transport(
                "upload task ended before completing".to_string(),
            )));
        }
    }
}
