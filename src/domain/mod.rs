//! Domain layer for rask-remote-logger.
//!
//! Contains the canonical types shared across all modules:
//! - `LogEvent`: the immutable event callers hand to the pipeline
//! - `LogLevel`: severity scale (Trace/Debug/Info/Warn/Error)
//! - `ShipperError`: top-level error type

pub mod error;
pub mod log_event;
pub mod log_level;

pub use error::ShipperError;
pub use log_event::{LogEvent, LogEventBuilder};
pub use log_level::{LogLevel, ParseLevelError};
