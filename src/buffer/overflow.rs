use super::queue::StagingQueue;
use crate::NOTIFY_TARGET;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Default ratio of the high-water mark at which trimming stops.
pub const DEFAULT_LOW_WATER_FRACTION: f64 = 3.0 / 4.0;

#[derive(Debug, Clone)]
pub struct OverflowConfig {
    /// High-water mark. Trimming starts once the depth exceeds it.
    pub max_queue_size: usize,
    pub low_water_fraction: f64,
    pub check_interval: Duration,
}

impl Default for OverflowConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 10_000,
            low_water_fraction: DEFAULT_LOW_WATER_FRACTION,
            check_interval: Duration::from_secs(1),
        }
    }
}

impl OverflowConfig {
    /// Depth the monitor trims down to, `floor(max * fraction)`.
    pub fn low_water_mark(&self) -> usize {
        (self.max_queue_size as f64 * self.low_water_fraction).floor() as usize
    }
}

/// Periodic task that keeps the staging queue under its ceiling by dropping
/// the oldest events.
pub struct OverflowMonitor {
    queue: Arc<StagingQueue>,
    config: OverflowConfig,
}

impl OverflowMonitor {
    pub fn new(queue: Arc<StagingQueue>, config: OverflowConfig) -> Self {
        Self { queue, config }
    }

    /// Run one inspection. Returns the number of evicted events.
    pub fn check_once(&self) -> usize {
        let depth = self.queue.len();
        debug!("{} messages in remote logging queue", depth);

        if depth <= self.config.max_queue_size {
            return 0;
        }

        warn!(
            target: NOTIFY_TARGET,
            max = self.config.max_queue_size,
            current = depth,
            "Overflow in remote logger message queue"
        );

        let evicted = self.queue.evict_oldest(self.config.low_water_mark());
        debug!(
            "Evicted {} oldest messages, {} remain",
            evicted,
            self.queue.len()
        );
        evicted
    }

    /// Loop until `cancel` fires: sleep the check interval, then inspect.
    pub async fn run(self, cancel: CancellationToken) {
        debug!(
            "Overflow monitor started (max={}, low_water={}, interval={:?})",
            self.config.max_queue_size,
            self.config.low_water_mark(),
            self.config.check_interval
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.config.check_interval) => {}
                _ = cancel.cancelled() => break,
            }
            self.check_once();
        }

        debug!("Overflow monitor stopped");
    }
}
