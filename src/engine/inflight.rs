//! In-flight request accounting
//!
//! A process-wide gauge of requests currently being simulated. The timing
//! model reads it to shape queueing delays. Slots are held through an RAII
//! guard so the decrement happens exactly once on every exit path, including
//! errors and mid-stream client disconnects.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Count of requests currently inside the engine
#[derive(Debug, Default)]
pub struct InflightGauge {
    count: AtomicUsize,
}

impl InflightGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current number of in-flight requests
    pub fn current(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

/// Holds one in-flight slot; releases it on drop
#[derive(Debug)]
pub struct InflightGuard {
    gauge: Arc<InflightGauge>,
}

impl InflightGuard {
    /// Take a slot. The slot is released when the guard drops.
    pub fn acquire(gauge: &Arc<InflightGauge>) -> Self {
        gauge.count.fetch_add(1, Ordering::SeqCst);
        Self {
            gauge: Arc::clone(gauge),
        }
    }
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.gauge.count.fetch_sub(1, Ordering::SeqCst);
    }
}
