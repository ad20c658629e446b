//! Asynchronous remote log shipping.
//!
//! Callers hand [`LogEvent`]s to a [`RemoteLogger`], which queues them without
//! blocking and delivers them to an HTTP collector from a pool of background
//! workers. Failed deliveries are retried after a pause, and the queue is
//! trimmed from the oldest end when it outgrows its ceiling.

#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_lossless,            // Infallible casts are clear enough with `as`
    clippy::cast_possible_truncation, // Safe within realistic value bounds (durations, sizes)
    clippy::cast_possible_wrap,       // Safe in non-negative contexts
    clippy::cast_precision_loss,      // Acceptable for metrics/display
    clippy::cast_sign_loss,           // Safe where values are known non-negative
    clippy::missing_errors_doc,       // Internal API
    clippy::missing_panics_doc,       // Internal API
    clippy::module_name_repetitions,  // e.g. QueueError in buffer module
    clippy::must_use_candidate,       // Annotated selectively on critical APIs
    clippy::doc_markdown              // Internal API
)]

pub mod app;
pub mod bridge;
pub mod buffer;
pub mod domain;
pub mod pipeline;
pub mod reliability;
pub mod sender;

// Re-export main types for easy access
pub use app::{App, Config};
pub use bridge::RemoteLoggerLayer;
pub use domain::{LogEvent, LogEventBuilder, LogLevel, ShipperError};
pub use pipeline::{PipelineConfig, PipelineStats, RemoteLogger, ShutdownReport};
pub use sender::{ConnectionFactory, HttpConnectionFactory, OutboundRequest, Payload};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tracing target of the pipeline's operator notifications: delivery
/// failures, recoveries, overflow warnings and dropped events.
pub const NOTIFY_TARGET: &str = "rask_remote_logger::notify";
