use super::visitor::EventVisitor;
use crate::domain::{LogEvent, LogLevel};
use crate::pipeline::RemoteLogger;
use std::sync::Arc;
use tracing::{Event, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// Targets never forwarded: the shipper itself and the HTTP stack it uses.
/// Forwarding them would turn every delivery into more deliveries.
pub const DEFAULT_IGNORED_TARGETS: &[&str] = &[
    "rask_remote_logger",
    "hyper",
    "hyper_util",
    "reqwest",
    "h2",
    "rustls",
];

/// `tracing` layer that ships every event it sees through a [`RemoteLogger`].
///
/// The event target becomes the logger name. Submission never blocks; a
/// submit error is written to stderr because it cannot go through tracing.
pub struct RemoteLoggerLayer {
    logger: Arc<RemoteLogger>,
    ignored_targets: Vec<String>,
}

impl RemoteLoggerLayer {
    pub fn new(logger: Arc<RemoteLogger>) -> Self {
        Self {
            logger,
            ignored_targets: DEFAULT_IGNORED_TARGETS
                .iter()
                .map(|t| (*t).to_string())
                .collect(),
        }
    }

    /// Also skip events whose target starts with `prefix`.
    pub fn ignore_target(mut self, prefix: impl Into<String>) -> Self {
        self.ignored_targets.push(prefix.into());
        self
    }

    pub fn logger(&self) -> &Arc<RemoteLogger> {
        &self.logger
    }

    fn is_ignored(&self, target: &str) -> bool {
        self.ignored_targets
            .iter()
            .any(|prefix| target.starts_with(prefix.as_str()))
    }
}

impl<S> Layer<S> for RemoteLoggerLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if self.is_ignored(metadata.target()) {
            return;
        }

        let mut visitor = EventVisitor::new();
        event.record(&mut visitor);

        let mut builder = LogEvent::builder(
            LogLevel::from(metadata.level()),
            metadata.target(),
            visitor.message,
        )
        .context(visitor.context);
        if let Some(class_name) = visitor.exception_class {
            builder = builder.exception_class(class_name);
        }
        if let Some(message) = visitor.exception_message {
            builder = builder.exception_message(message);
        }
        if let Some(marker) = visitor.marker {
            builder = builder.marker(marker);
        }

        if let Err(e) = self.logger.submit(builder.build()) {
            eprintln!("rask-remote-logger: failed to submit event: {e}");
        }
    }
}
