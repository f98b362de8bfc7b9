use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
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
            "photofeed_cache_hit_total",
            Unit::Count,
            "Cache lookups answered with a decodable payload."
        );
        describe_counter!(
            "photofeed_cache_miss_total",
            Unit::Count,
            "Cache lookups that found no entry."
        );
        describe_counter!(
            "photofeed_cache_corrupt_total",
            Unit::Count,
            "Cache payloads that failed to decode and were treated as misses."
        );
        describe_counter!(
            "photofeed_cache_error_total",
            Unit::Count,
            "Cache operations that failed or timed out."
        );
        describe_counter!(
            "photofeed_cache_invalidate_total",
            Unit::Count,
            "Cache keys evicted after writes."
        );
        describe_histogram!(
            "photofeed_assemble_posts",
            Unit::Count,
            "Hydrated posts returned per batch assembly."
        );
    });
}
