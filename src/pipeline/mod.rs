//! Wiring between producers, the staging queue and the dispatch workers.

pub mod gate;
pub mod stats;
mod worker;

pub use gate::SeverityGate;
pub use stats::PipelineStats;

use crate::buffer::{OverflowConfig, OverflowMonitor, StagingQueue};
use crate::domain::{LogEvent, LogLevel, ShipperError};
use crate::reliability::FailureReporter;
use crate::sender::{ConnectionFactory, PayloadEncoder};
use futures::future::join_all;
use parking_lot::Mutex;
use stats::StatsCollector;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use worker::DispatchWorker;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Runtime settings of the pipeline, fixed once the logger is built.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub endpoint: Url,
    pub min_level: LogLevel,
    pub overflow: OverflowConfig,
    /// Pause after every failed delivery. Twice this value is the cool-down
    /// between repeated failure notifications.
    pub error_wait_time: Duration,
    pub parallel_requests: usize,
    pub compress: bool,
}

impl PipelineConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            min_level: LogLevel::Info,
            overflow: OverflowConfig::default(),
            error_wait_time: Duration::from_secs(2),
            parallel_requests: 4,
            compress: false,
        }
    }
}

/// Outcome of [`RemoteLogger::shutdown`].
#[derive(Debug, Clone)]
pub struct ShutdownReport {
    /// Events still queued when the tasks stopped.
    pub undelivered: usize,
    pub stats: PipelineStats,
}

/// Asynchronous remote log shipper.
///
/// `submit` never waits on the network: admitted events go into a shared
/// queue and a pool of `parallel_requests` workers delivers them in the
/// background. A monitor task evicts the oldest events whenever the queue
/// grows past `overflow.max_queue_size`.
pub struct RemoteLogger {
    config: PipelineConfig,
    gate: SeverityGate,
    queue: Arc<StagingQueue>,
    reporter: Arc<FailureReporter>,
    stats: Arc<StatsCollector>,
    accepting: AtomicBool,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    report: OnceCell<ShutdownReport>,
}

impl RemoteLogger {
    /// Build the pipeline on the ambient tokio runtime.
    pub fn new<F: ConnectionFactory>(
        config: PipelineConfig,
        factory: F,
    ) -> Result<Self, ShipperError> {
        let handle =
            Handle::try_current().map_err(|e| ShipperError::Runtime(e.to_string()))?;
        Self::with_runtime(config, factory, &handle)
    }

    /// Build the pipeline and spawn its tasks on `handle`.
    pub fn with_runtime<F: ConnectionFactory>(
        config: PipelineConfig,
        factory: F,
        handle: &Handle,
    ) -> Result<Self, ShipperError> {
        let reporter = Arc::new(FailureReporter::new(config.error_wait_time));
        Self::build(config, factory, handle, reporter)
    }

    /// Same as [`with_runtime`](Self::with_runtime) with a caller-supplied
    /// failure reporter, e.g. one driven by a manual clock.
    pub fn with_reporter<F: ConnectionFactory>(
        config: PipelineConfig,
        factory: F,
        handle: &Handle,
        reporter: Arc<FailureReporter>,
    ) -> Result<Self, ShipperError> {
        Self::build(config, factory, handle, reporter)
    }

    fn build<F: ConnectionFactory>(
        config: PipelineConfig,
        factory: F,
        handle: &Handle,
        reporter: Arc<FailureReporter>,
    ) -> Result<Self, ShipperError> {
        validate(&config)?;

        let queue = Arc::new(StagingQueue::new());
        let stats = Arc::new(StatsCollector::default());
        let cancel = CancellationToken::new();
        let factory = Arc::new(factory);
        let endpoint = Arc::new(config.endpoint.clone());
        let encoder = PayloadEncoder::new(config.compress);

        let mut tasks = Vec::with_capacity(config.parallel_requests + 1);

        let monitor = OverflowMonitor::new(queue.clone(), config.overflow.clone());
        tasks.push(handle.spawn(monitor.run(cancel.child_token())));

        for id in 0..config.parallel_requests {
            let worker = DispatchWorker::new(
                id,
                queue.clone(),
                factory.clone(),
                endpoint.clone(),
                encoder.clone(),
                reporter.clone(),
                stats.clone(),
                config.error_wait_time,
            );
            tasks.push(handle.spawn(worker.run(cancel.child_token())));
        }

        info!(
            "Remote logger started: endpoint={}, workers={}, min_level={}",
            config.endpoint, config.parallel_requests, config.min_level
        );

        Ok(Self {
            gate: SeverityGate::new(config.min_level),
            config,
            queue,
            reporter,
            stats,
            accepting: AtomicBool::new(true),
            cancel,
            tasks: Mutex::new(tasks),
            report: OnceCell::new(),
        })
    }

    /// Hand an event to the pipeline without blocking.
    ///
    /// Events below the minimum level are dropped silently. An error means the
    /// event was admitted but could not be queued.
    pub fn submit(&self, event: LogEvent) -> Result<(), ShipperError> {
        if !self.gate.admit(event.level()) {
            self.stats.record_filtered();
            return Ok(());
        }
        if !self.accepting.load(Ordering::Acquire) {
            return Err(ShipperError::ShuttingDown);
        }

        self.queue.insert(event)?;
        self.stats.record_submitted();
        Ok(())
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    pub fn is_failing(&self) -> bool {
        self.reporter.is_failing()
    }

    pub fn stats(&self) -> PipelineStats {
        let queue = self.queue.metrics();
        PipelineStats {
            evicted: queue.evicted,
            queue_depth: self.queue.len(),
            failing: self.reporter.is_failing(),
            notifications: self.reporter.notification_count(),
            ..self.stats.snapshot()
        }
    }

    /// Stop accepting events, give the workers up to `grace` to drain the
    /// queue, then stop every task.
    ///
    /// Only the first call drains. Later or concurrent calls wait for it to
    /// finish and get the same report.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        self.report.get_or_init(|| self.stop(grace)).await.clone()
    }

    async fn stop(&self, grace: Duration) -> ShutdownReport {
        self.accepting.store(false, Ordering::Release);
        info!(
            "Shutting down remote logger, {} messages pending",
            self.queue.len()
        );
        self.drain(grace).await;

        self.cancel.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for result in join_all(tasks).await {
            if let Err(e) = result {
                warn!("Remote logger task ended abnormally: {}", e);
            }
        }
        self.queue.close();

        let report = ShutdownReport {
            undelivered: self.queue.len(),
            stats: self.stats(),
        };
        if report.undelivered > 0 {
            warn!(
                "Remote logger stopped with {} undelivered messages",
                report.undelivered
            );
        } else {
            debug!("Remote logger stopped, queue drained");
        }
        report
    }

    async fn drain(&self, grace: Duration) {
        let deadline = tokio::time::Instant::now() + grace;
        while !self.is_idle()
            && !self.cancel.is_cancelled()
            && tokio::time::Instant::now() < deadline
        {
            tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
        }
    }

    fn is_idle(&self) -> bool {
        self.queue.is_idle()
    }
}

impl Drop for RemoteLogger {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for RemoteLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteLogger")
            .field("endpoint", &self.config.endpoint.as_str())
            .field("min_level", &self.config.min_level)
            .field("queue_depth", &self.queue.len())
            .field("accepting", &self.accepting.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

fn validate(config: &PipelineConfig) -> Result<(), ShipperError> {
    use crate::app::ConfigError;

    let invalid = |msg: String| ShipperError::from(ConfigError::InvalidConfig(msg));

    if config.parallel_requests == 0 {
        return Err(invalid("parallel_requests must be at least 1".into()));
    }
    if config.overflow.max_queue_size == 0 {
        return Err(invalid("max_queue_size must be positive".into()));
    }
    let fraction = config.overflow.low_water_fraction;
    if !(fraction > 0.0 && fraction <= 1.0) {
        return Err(invalid(format!(
            "low_water_fraction must be in (0, 1], got {fraction}"
        )));
    }
    if config.overflow.check_interval.is_zero() {
        return Err(invalid("queue check interval must be positive".into()));
    }
    if config.error_wait_time.is_zero() {
        return Err(invalid("error_wait_time must be positive".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sender::{OutboundRequest, Payload, TransportError};

    struct AcceptAll;
    struct AcceptRequest;

    impl OutboundRequest for AcceptRequest {
        async fn send(self, _payload: Payload) -> Result<u16, TransportError> {
            Ok(200)
        }
    }

    impl ConnectionFactory for AcceptAll {
        type Request = AcceptRequest;

        fn create(&self, _endpoint: &Url) -> Result<AcceptRequest, TransportError> {
            Ok(AcceptRequest)
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig::new(Url::parse("http://collector.test/log").unwrap())
    }

    #[test]
    fn test_new_without_runtime_fails() {
        let err = RemoteLogger::new(config(), AcceptAll).unwrap_err();
        assert!(matches!(err, ShipperError::Runtime(_)));
    }

    #[tokio::test]
    async fn test_zero_workers_is_rejected() {
        let mut config = config();
        config.parallel_requests = 0;
        let err = RemoteLogger::new(config, AcceptAll).unwrap_err();
        assert!(matches!(err, ShipperError::Config(_)));
    }

    #[tokio::test]
    async fn test_fraction_out_of_range_is_rejected() {
        let mut config = config();
        config.overflow.low_water_fraction = 1.5;
        assert!(RemoteLogger::new(config, AcceptAll).is_err());
    }

    #[tokio::test]
    async fn test_zero_error_wait_is_rejected() {
        let mut config = config();
        config.error_wait_time = Duration::ZERO;
        let err = RemoteLogger::new(config, AcceptAll).unwrap_err();
        assert!(matches!(err, ShipperError::Config(_)));
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_is_refused() {
        let logger = RemoteLogger::new(config(), AcceptAll).unwrap();
        logger.shutdown(Duration::from_millis(50)).await;

        let err = logger
            .submit(LogEvent::builder(LogLevel::Error, "t", "late").build())
            .unwrap_err();
        assert!(matches!(err, ShipperError::ShuttingDown));
    }

    #[tokio::test]
    async fn test_filtered_events_are_counted_not_queued() {
        let logger = RemoteLogger::new(config(), AcceptAll).unwrap();
        logger
            .submit(LogEvent::builder(LogLevel::Debug, "t", "noise").build())
            .unwrap();

        let stats = logger.stats();
        assert_eq!(stats.filtered, 1);
        assert_eq!(stats.submitted, 0);
        logger.shutdown(Duration::ZERO).await;
    }
}
