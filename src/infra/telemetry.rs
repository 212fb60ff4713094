use metrics::{Unit, describe_counter};
use once_cell::sync::OnceCell;
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use tracing::level_filters::LevelFilter;

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: OnceCell<()> = OnceCell::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(logging.level).into())
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
    METRIC_DESCRIPTIONS.get_or_init(|| {
        describe_counter!(
            "foliant_cache_hit_total",
            Unit::Count,
            "Cache hits, labeled by cache component."
        );
        describe_counter!(
            "foliant_cache_miss_total",
            Unit::Count,
            "Cache misses, labeled by cache component."
        );
        describe_counter!(
            "foliant_cache_sweep_total",
            Unit::Count,
            "Bulk namespace sweeps, labeled by cache component."
        );
        describe_counter!(
            "foliant_render_total",
            Unit::Count,
            "Pipeline executions that produced HTML."
        );
        describe_counter!(
            "foliant_render_degraded_total",
            Unit::Count,
            "Pipeline executions that fell back to escaped raw text."
        );
        describe_counter!(
            "foliant_plugin_failure_total",
            Unit::Count,
            "Plugin hooks that failed and were skipped."
        );
    });
}
