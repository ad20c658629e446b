use super::stats::StatsCollector;
use crate::NOTIFY_TARGET;
use crate::buffer::StagingQueue;
use crate::domain::LogEvent;
use crate::reliability::FailureReporter;
use crate::sender::{
    ConnectionFactory, OutboundRequest, PayloadEncoder, TransportError, is_accepted,
};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};
use url::Url;

/// Delivers events from the staging queue, one at a time.
///
/// A failed delivery puts the event back at the tail of the queue and parks
/// the worker for `error_wait_time` before it takes the next one.
pub(crate) struct DispatchWorker<F: ConnectionFactory> {
    id: usize,
    queue: Arc<StagingQueue>,
    factory: Arc<F>,
    endpoint: Arc<Url>,
    encoder: PayloadEncoder,
    reporter: Arc<FailureReporter>,
    stats: Arc<StatsCollector>,
    error_wait_time: Duration,
}

impl<F: ConnectionFactory> DispatchWorker<F> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        id: usize,
        queue: Arc<StagingQueue>,
        factory: Arc<F>,
        endpoint: Arc<Url>,
        encoder: PayloadEncoder,
        reporter: Arc<FailureReporter>,
        stats: Arc<StatsCollector>,
        error_wait_time: Duration,
    ) -> Self {
        Self {
            id,
            queue,
            factory,
            endpoint,
            encoder,
            reporter,
            stats,
            error_wait_time,
        }
    }

    pub(crate) async fn run(self, cancel: CancellationToken) {
        debug!("Dispatch worker {} started", self.id);

        loop {
            let event = match self.queue.remove(&cancel).await {
                Ok(event) => event,
                Err(e) => {
                    debug!("Dispatch worker {} stopping: {}", self.id, e);
                    break;
                }
            };

            let outcome = tokio::select! {
                result = self.deliver(&event) => Some(result),
                _ = cancel.cancelled() => None,
            };

            let Some(result) = outcome else {
                // Abandoned mid-flight, keep it for the shutdown report.
                self.return_unsent(event);
                self.queue.settle();
                break;
            };

            match result {
                Ok(()) => {
                    self.stats.record_delivered();
                    self.queue.settle();
                    self.reporter.report_recovery(self.queue.len());
                    trace!("Worker {} delivered event", self.id);
                }
                Err(err) => {
                    self.stats.record_failed_attempt();
                    debug!("Worker {} failed to deliver event: {}", self.id, err);
                    self.requeue_or_drop(event);
                    self.queue.settle();
                    self.reporter.report_failure(self.queue.len(), &err);

                    tokio::select! {
                        _ = tokio::time::sleep(self.error_wait_time) => {}
                        _ = cancel.cancelled() => break,
                    }
                }
            }
        }

        debug!("Dispatch worker {} stopped", self.id);
    }

    async fn deliver(&self, event: &LogEvent) -> Result<(), TransportError> {
        let payload = self.encoder.encode(event)?;
        let request = self.factory.create(&self.endpoint)?;
        let status = request.send(payload).await?;

        if is_accepted(status) {
            Ok(())
        } else {
            Err(TransportError::Rejected { status })
        }
    }

    fn requeue_or_drop(&self, event: LogEvent) {
        match self.queue.insert(event) {
            Ok(()) => self.stats.record_requeued(),
            Err(e) => {
                let dropped = self.stats.record_dropped();
                let depth = self.queue.len();
                error!(
                    target: NOTIFY_TARGET,
                    waiting = depth,
                    dropped,
                    cause = %e,
                    "Failed to requeue message, dropping it. {} waiting messages",
                    depth
                );
            }
        }
    }

    fn return_unsent(&self, event: LogEvent) {
        if let Err(e) = self.queue.insert(event) {
            let dropped = self.stats.record_dropped();
            warn!(
                target: NOTIFY_TARGET,
                dropped,
                "Lost in-flight message during shutdown: {}",
                e
            );
        }
    }
}
