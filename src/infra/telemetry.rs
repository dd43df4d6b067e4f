use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::{
    application::catalog::{
        METRIC_FETCH_COALESCED, METRIC_STALE_SERVED, METRIC_STORE_HIT, METRIC_STORE_MISS,
        METRIC_UPSTREAM_ERROR, METRIC_UPSTREAM_FETCH_MS,
    },
    cache::{METRIC_TAG_INVALIDATED, METRIC_TAG_TIER_EVICT, METRIC_TAG_TIER_HIT, METRIC_TAG_TIER_MISS},
    config::{LogFormat, LoggingSettings},
};

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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            METRIC_STORE_HIT,
            Unit::Count,
            "Lookups answered by a fresh persisted row."
        );
        describe_counter!(
            METRIC_STORE_MISS,
            Unit::Count,
            "Lookups without a fresh persisted row."
        );
        describe_counter!(
            METRIC_STALE_SERVED,
            Unit::Count,
            "Expired rows served because the upstream refresh produced nothing."
        );
        describe_counter!(
            METRIC_UPSTREAM_ERROR,
            Unit::Count,
            "Failed upstream fetches."
        );
        describe_counter!(
            METRIC_FETCH_COALESCED,
            Unit::Count,
            "Requests answered by a concurrent fetch for the same key."
        );
        describe_histogram!(
            METRIC_UPSTREAM_FETCH_MS,
            Unit::Milliseconds,
            "Upstream fetch latency in milliseconds."
        );
        describe_counter!(
            METRIC_TAG_TIER_HIT,
            Unit::Count,
            "Rendered responses served from the tag tier."
        );
        describe_counter!(
            METRIC_TAG_TIER_MISS,
            Unit::Count,
            "Tag tier lookups that reached the handler."
        );
        describe_counter!(
            METRIC_TAG_TIER_EVICT,
            Unit::Count,
            "Tag tier evictions due to capacity."
        );
        describe_counter!(
            METRIC_TAG_INVALIDATED,
            Unit::Count,
            "Revalidation tags invalidated."
        );
    });
}
