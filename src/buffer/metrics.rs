use serde::Serialize;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Point-in-time view of the staging queue counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueueMetrics {
    pub inserted: u64,
    pub removed: u64,
    pub evicted: u64,
    pub rejected: u64,
    pub peak_depth: usize,
}

/// Lock-free counters updated by the queue on every operation.
#[derive(Debug, Default)]
pub struct QueueMetricsCollector {
    inserted: AtomicU64,
    removed: AtomicU64,
    evicted: AtomicU64,
    rejected: AtomicU64,
    peak_depth: AtomicUsize,
}

impl QueueMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_insert(&self, depth_after: usize) {
        self.inserted.fetch_add(1, Ordering::Relaxed);
        self.update_peak(depth_after);
    }

    pub(crate) fn record_remove(&self) {
        self.removed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_evicted(&self, count: u64) {
        self.evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn update_peak(&self, depth: usize) {
        let mut peak = self.peak_depth.load(Ordering::Relaxed);
        while depth > peak {
            match self.peak_depth.compare_exchange_weak(
                peak,
                depth,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(x) => peak = x,
            }
        }
    }

    pub fn snapshot(&self) -> QueueMetrics {
        QueueMetrics {
            inserted: self.inserted.load(Ordering::Relaxed),
            removed: self.removed.load(Ordering::Relaxed),
            evicted: self.evicted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            peak_depth: self.peak_depth.load(Ordering::Relaxed),
        }
    }
}
