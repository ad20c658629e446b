use super::error::QueueError;
use super::metrics::{QueueMetrics, QueueMetricsCollector};
use crate::domain::LogEvent;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::pin::pin;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Default)]
struct QueueState {
    events: VecDeque<LogEvent>,
    /// Events handed out by `remove` and not yet settled.
    in_flight: usize,
    closed: bool,
}

/// Shared FIFO between producers, the overflow monitor and dispatch workers.
///
/// The queue has no capacity of its own: inserts never block and only fail
/// once the queue is closed. The size ceiling is enforced asynchronously by
/// [`OverflowMonitor`](super::OverflowMonitor).
///
/// Removal order is FIFO. With several concurrent removers each call gets a
/// distinct event, but which waiter wins a given event is unspecified.
pub struct StagingQueue {
    state: Mutex<QueueState>,
    available: Notify,
    metrics: QueueMetricsCollector,
}

impl StagingQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            available: Notify::new(),
            metrics: QueueMetricsCollector::new(),
        }
    }

    /// Append an event at the tail without blocking.
    #[inline]
    pub fn insert(&self, event: LogEvent) -> Result<(), QueueError> {
        let depth = {
            let mut state = self.state.lock();
            if state.closed {
                let pending = state.events.len();
                drop(state);
                self.metrics.record_rejected();
                return Err(QueueError::Closed { pending });
            }
            state.events.push_back(event);
            state.events.len()
        };

        self.metrics.record_insert(depth);
        self.available.notify_one();
        Ok(())
    }

    /// Pop the head if there is one.
    pub fn try_remove(&self) -> Option<LogEvent> {
        let event = self.state.lock().events.pop_front();
        if event.is_some() {
            self.metrics.record_remove();
        }
        event
    }

    /// Wait until an event is available and pop it.
    ///
    /// The popped event counts as in flight until the caller calls
    /// [`settle`](Self::settle). Returns `Cancelled` as soon as `cancel`
    /// fires, and `Closed` once the queue is closed and drained. A closed
    /// queue still hands out the events it holds.
    pub async fn remove(&self, cancel: &CancellationToken) -> Result<LogEvent, QueueError> {
        loop {
            // Register interest before checking state so an insert between
            // the check and the await cannot be missed.
            let mut notified = pin!(self.available.notified());
            notified.as_mut().enable();

            {
                let mut state = self.state.lock();
                if let Some(event) = state.events.pop_front() {
                    state.in_flight += 1;
                    drop(state);
                    self.metrics.record_remove();
                    return Ok(event);
                }
                if state.closed {
                    return Err(QueueError::Closed { pending: 0 });
                }
            }

            tokio::select! {
                _ = notified.as_mut() => {}
                _ = cancel.cancelled() => return Err(QueueError::Cancelled),
            }
        }
    }

    /// Drop events from the head until at most `target_len` remain.
    ///
    /// Returns how many were evicted.
    pub fn evict_oldest(&self, target_len: usize) -> usize {
        let evicted = {
            let mut state = self.state.lock();
            let excess = state.events.len().saturating_sub(target_len);
            state.events.drain(..excess).count()
        };

        if evicted > 0 {
            self.metrics.record_evicted(evicted as u64);
        }
        evicted
    }

    /// Reject further inserts and wake every waiter.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_waiters();
    }

    /// Release an event taken with `remove`, after it was delivered, put
    /// back or dropped.
    pub fn settle(&self) {
        let mut state = self.state.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight
    }

    /// No queued events and none awaiting an outcome.
    pub fn is_idle(&self) -> bool {
        let state = self.state.lock();
        state.events.is_empty() && state.in_flight == 0
    }

    /// Current depth. The value may be stale by the time the caller looks at it.
    pub fn len(&self) -> usize {
        self.state.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.metrics.snapshot()
    }
}

impl Default for StagingQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StagingQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("StagingQueue")
            .field("len", &state.events.len())
            .field("in_flight", &state.in_flight)
            .field("closed", &state.closed)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LogLevel;
    use std::sync::Arc;
    use std::time::Duration;

    fn event(message: &str) -> LogEvent {
        LogEvent::builder(LogLevel::Info, "test", message).build()
    }

    #[test]
    fn test_fifo_order() {
        let queue = StagingQueue::new();
        for i in 0..5 {
            queue.insert(event(&format!("m{i}"))).unwrap();
        }

        let drained: Vec<String> = std::iter::from_fn(|| queue.try_remove())
            .map(|e| e.message().to_string())
            .collect();
        assert_eq!(drained, vec!["m0", "m1", "m2", "m3", "m4"]);
    }

    #[test]
    fn test_insert_after_close_is_rejected() {
        let queue = StagingQueue::new();
        queue.insert(event("kept")).unwrap();
        queue.close();

        let err = queue.insert(event("late")).unwrap_err();
        assert_eq!(err, QueueError::Closed { pending: 1 });
        assert_eq!(queue.metrics().rejected, 1);
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_evict_oldest_keeps_newest() {
        let queue = StagingQueue::new();
        for i in 0..11 {
            queue.insert(event(&format!("m{i}"))).unwrap();
        }

        let evicted = queue.evict_oldest(7);
        assert_eq!(evicted, 4);
        assert_eq!(queue.len(), 7);
        assert_eq!(queue.try_remove().unwrap().message(), "m4");
        assert_eq!(queue.metrics().evicted, 4);
    }

    #[test]
    fn test_evict_below_target_is_noop() {
        let queue = StagingQueue::new();
        queue.insert(event("only")).unwrap();
        assert_eq!(queue.evict_oldest(5), 0);
        assert_eq!(queue.len(), 1);
    }

    #[tokio::test]
    async fn test_removed_event_keeps_queue_busy_until_settled() {
        let queue = StagingQueue::new();
        let cancel = CancellationToken::new();
        queue.insert(event("taken")).unwrap();

        let taken = queue.remove(&cancel).await.unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.in_flight(), 1);
        assert!(!queue.is_idle());

        queue.insert(taken).unwrap();
        queue.settle();
        assert_eq!(queue.in_flight(), 0);
        assert!(!queue.is_idle());

        assert!(queue.try_remove().is_some());
        assert!(queue.is_idle());
    }

    #[tokio::test]
    async fn test_remove_waits_for_insert() {
        let queue = Arc::new(StagingQueue::new());
        let cancel = CancellationToken::new();

        let waiter = {
            let queue = queue.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { queue.remove(&cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        queue.insert(event("late arrival")).unwrap();
        let received = waiter.await.unwrap().unwrap();
        assert_eq!(received.message(), "late arrival");
    }

    #[tokio::test]
    async fn test_remove_returns_cancelled() {
        let queue = StagingQueue::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = queue.remove(&cancel).await;
        assert_eq!(result.unwrap_err(), QueueError::Cancelled);
    }

    #[tokio::test]
    async fn test_closed_queue_drains_then_reports_closed() {
        let queue = StagingQueue::new();
        let cancel = CancellationToken::new();
        queue.insert(event("pending")).unwrap();
        queue.close();

        assert_eq!(queue.remove(&cancel).await.unwrap().message(), "pending");
        assert!(matches!(
            queue.remove(&cancel).await,
            Err(QueueError::Closed { .. })
        ));
    }

    #[tokio::test]
    async fn test_close_wakes_blocked_waiters() {
        let queue = Arc::new(StagingQueue::new());
        let cancel = CancellationToken::new();

        let mut waiters = Vec::new();
        for _ in 0..3 {
            let queue = queue.clone();
            let cancel = cancel.clone();
            waiters.push(tokio::spawn(async move { queue.remove(&cancel).await }));
        }

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.close();

        for waiter in waiters {
            let result = tokio::time::timeout(Duration::from_secs(1), waiter)
                .await
                .unwrap()
                .unwrap();
            assert!(matches!(result, Err(QueueError::Closed { .. })));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_removers_get_distinct_events() {
        let queue = Arc::new(StagingQueue::new());
        let cancel = CancellationToken::new();
        let total = 200;

        let mut consumers = Vec::new();
        for _ in 0..4 {
            let queue = queue.clone();
            let cancel = cancel.clone();
            consumers.push(tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Ok(event) = queue.remove(&cancel).await {
                    seen.push(event.id());
                }
                seen
            }));
        }

        for i in 0..total {
            queue.insert(event(&format!("m{i}"))).unwrap();
        }
        while !queue.is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        queue.close();

        let mut ids = Vec::new();
        for consumer in consumers {
            ids.extend(consumer.await.unwrap());
        }
        let before = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(before, total);
        assert_eq!(ids.len(), total);
    }
}
