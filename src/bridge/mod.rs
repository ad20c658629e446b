//! Adapter from `tracing` to the remote logger.

mod layer;
mod visitor;

pub use layer::{DEFAULT_IGNORED_TARGETS, RemoteLoggerLayer};
