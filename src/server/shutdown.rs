//! Graceful shutdown
//!
//! Waits for a termination signal, then drains on the engine's in-flight
//! gauge so requests mid-simulation finish before the process exits.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::engine::InflightGauge;

/// Resolves when a shutdown signal arrives and in-flight requests drain
pub async fn graceful_shutdown(gauge: Arc<InflightGauge>, drain_timeout: Duration) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }

    wait_for_drain(&gauge, drain_timeout).await;
}

/// Wait until the gauge reaches zero or the timeout passes
pub async fn wait_for_drain(gauge: &InflightGauge, drain_timeout: Duration) {
    let drain_start = Instant::now();

    while gauge.current() > 0 {
        if drain_start.elapsed() > drain_timeout {
            warn!(
                remaining_requests = gauge.current(),
                "Drain timeout exceeded, forcing shutdown"
            );
            return;
        }

        info!(
            in_flight = gauge.current(),
            elapsed_ms = drain_start.elapsed().as_millis() as u64,
            "Waiting for in-flight requests to complete"
        );

        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    info!("All requests drained, proceeding with shutdown");
}
