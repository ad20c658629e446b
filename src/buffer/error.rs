use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    /// The queue no longer accepts events, or is closed and fully drained.
    #[error("Staging queue is closed ({pending} events pending)")]
    Closed { pending: usize },

    /// The waiting task was cancelled before an event became available.
    #[error("Wait on staging queue was cancelled")]
    Cancelled,
}
