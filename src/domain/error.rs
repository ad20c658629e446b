use crate::app::ConfigError;
use crate::buffer::QueueError;
use crate::sender::TransportError;
use thiserror::Error;

/// Top-level error type for the remote logger.
#[derive(Error, Debug)]
pub enum ShipperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("No tokio runtime available: {0}")]
    Runtime(String),

    #[error("Remote logger is shutting down")]
    ShuttingDown,
}
