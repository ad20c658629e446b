use super::clock::{Clock, SystemClock};
use crate::NOTIFY_TARGET;
use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info};

/// Tracks whether deliveries are currently failing and rate-limits the
/// resulting error notifications.
///
/// The first failure of an episode is always reported. While the episode
/// lasts, a further notification goes out only when more than `cool_down`
/// has passed since the previous one. Workers race on both transitions with
/// compare-and-swap, so a single worker wins each notification.
///
/// A successful delivery ends the episode through [`report_recovery`].
///
/// [`report_recovery`]: FailureReporter::report_recovery
pub struct FailureReporter {
    failing: AtomicBool,
    last_notification_ms: AtomicU64,
    notifications: AtomicU64,
    recoveries: AtomicU64,
    cool_down: Duration,
    origin: Instant,
    clock: Arc<dyn Clock>,
}

impl FailureReporter {
    /// Reporter whose cool-down is twice the post-failure wait.
    pub fn new(error_wait_time: Duration) -> Self {
        Self::with_clock(error_wait_time, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(error_wait_time: Duration, clock: Arc<dyn Clock>) -> Self {
        let origin = clock.now();
        Self {
            failing: AtomicBool::new(false),
            last_notification_ms: AtomicU64::new(0),
            notifications: AtomicU64::new(0),
            recoveries: AtomicU64::new(0),
            cool_down: error_wait_time.saturating_mul(2),
            origin,
            clock,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.clock
            .now()
            .saturating_duration_since(self.origin)
            .as_millis() as u64
    }

    /// Record a failed delivery. Returns whether a notification was emitted.
    pub fn report_failure(&self, queue_depth: usize, cause: &dyn Display) -> bool {
        let now_ms = self.elapsed_ms();

        if self
            .failing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.last_notification_ms.store(now_ms, Ordering::Release);
            self.notifications.fetch_add(1, Ordering::Relaxed);
            error!(
                target: NOTIFY_TARGET,
                waiting = queue_depth,
                cause = %cause,
                "Error in remote logger! {} waiting messages!",
                queue_depth
            );
            return true;
        }

        let last = self.last_notification_ms.load(Ordering::Acquire);
        let cool_down_ms = self.cool_down.as_millis() as u64;
        if now_ms.saturating_sub(last) > cool_down_ms
            && self
                .last_notification_ms
                .compare_exchange(last, now_ms, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            self.notifications.fetch_add(1, Ordering::Relaxed);
            error!(
                target: NOTIFY_TARGET,
                waiting = queue_depth,
                cause = %cause,
                "Error in remote logger! {} waiting messages!",
                queue_depth
            );
            return true;
        }

        false
    }

    /// Record a successful delivery. Ends a failure episode if one is open and
    /// returns whether that happened.
    pub fn report_recovery(&self, queue_depth: usize) -> bool {
        if self
            .failing
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.recoveries.fetch_add(1, Ordering::Relaxed);
            info!(
                target: NOTIFY_TARGET,
                waiting = queue_depth,
                "Remote logging recovered, {} waiting messages",
                queue_depth
            );
            return true;
        }
        false
    }

    pub fn is_failing(&self) -> bool {
        self.failing.load(Ordering::Acquire)
    }

    /// Failure notifications emitted so far.
    pub fn notification_count(&self) -> u64 {
        self.notifications.load(Ordering::Relaxed)
    }

    pub fn recovery_count(&self) -> u64 {
        self.recoveries.load(Ordering::Relaxed)
    }

    pub fn cool_down(&self) -> Duration {
        self.cool_down
    }
}

impl std::fmt::Debug for FailureReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureReporter")
            .field("failing", &self.is_failing())
            .field("notifications", &self.notification_count())
            .field("cool_down", &self.cool_down)
            .finish()
    }
}
