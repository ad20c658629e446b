use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time view of the whole pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineStats {
    /// Events accepted into the queue.
    pub submitted: u64,
    /// Events rejected by the severity gate.
    pub filtered: u64,
    pub delivered: u64,
    pub failed_attempts: u64,
    pub requeued: u64,
    /// Events lost because the requeue after a failure was rejected.
    pub dropped: u64,
    /// Events discarded by the overflow monitor.
    pub evicted: u64,
    pub queue_depth: usize,
    pub failing: bool,
    pub notifications: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCollector {
    submitted: AtomicU64,
    filtered: AtomicU64,
    delivered: AtomicU64,
    failed_attempts: AtomicU64,
    requeued: AtomicU64,
    dropped: AtomicU64,
}

impl StatsCollector {
    pub(crate) fn record_submitted(&self) {
        self.submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_filtered(&self) {
        self.filtered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delivered(&self) {
        self.delivered.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_attempt(&self) {
        self.failed_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_requeued(&self) {
        self.requeued.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Snapshot of the pipeline-owned counters. Queue and reporter fields are
    /// left at their defaults for the caller to fill in.
    pub(crate) fn snapshot(&self) -> PipelineStats {
        PipelineStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            filtered: self.filtered.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            requeued: self.requeued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
            ..PipelineStats::default()
        }
    }
}
