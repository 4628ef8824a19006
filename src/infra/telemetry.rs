use std::sync::Once;

use metrics::{Unit, describe_counter};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::application::uploads::{
    METRIC_UPLOAD_FAILED, METRIC_UPLOAD_RETRIED, METRIC_UPLOAD_STARTED, METRIC_UPLOAD_SUCCEEDED,
};
use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
///
/// Log lines go to stderr so command output on stdout stays machine-readable.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_UPLOAD_STARTED,
            Unit::Count,
            "Image uploads dispatched, retries included."
        );
        describe_counter!(
            METRIC_UPLOAD_SUCCEEDED,
            Unit::Count,
            "Image uploads that returned a remote URL."
        );
        describe_counter!(
            METRIC_UPLOAD_FAILED,
            Unit::Count,
            "Image uploads that failed, labelled by reason."
        );
        describe_counter!(
            METRIC_UPLOAD_RETRIED,
            Unit::Count,
            "Failed image uploads re-dispatched by the user."
        );
    });
}
