pub mod error;
pub mod metrics;
pub mod overflow;
pub mod queue;

pub use error::QueueError;
pub use metrics::{QueueMetrics, QueueMetricsCollector};
pub use overflow::{DEFAULT_LOW_WATER_FRACTION, OverflowConfig, OverflowMonitor};
pub use queue::StagingQueue;
