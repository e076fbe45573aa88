//! Logging setup
//!
//! Structured logging with tracing, either compact for terminals or JSON
//! for log pipelines. `RUST_LOG` wins over the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::TelemetryConfig;

/// Initialize the tracing subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init_telemetry(config: &TelemetryConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_file(true)
            .with_line_number(true)
            .with_target(true);

        registry.with(json_layer).try_init()
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_file(false)
            .with_line_number(false)
            .with_target(true)
            .compact();

        registry.with(fmt_layer).try_init()
    };

    if result.is_ok() {
        tracing::info!(
            version = %env!("CARGO_PKG_VERSION"),
            "Telemetry initialized"
        );
    }
}
