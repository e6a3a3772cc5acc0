//! Telemetry: structured logging and per-operation spans

pub mod logger;
pub mod tracer;

pub use logger::Logger;
pub use tracer::{NoopTracer, SpanGuard, SpanHandle, Tracer, TracingTracer};

use crate::config::TelemetryConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global `tracing` subscriber.
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init(config: &TelemetryConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.default_filter.clone().into());

    let registry = tracing_subscriber::registry().with(env_filter);

    // Event fields are flattened so `message` stays top-level in JSON logs.
    let result = if config.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
