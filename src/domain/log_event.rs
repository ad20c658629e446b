use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// A single logging occurrence handed to the remote logger.
///
/// Events are immutable once built. The same value travels from the caller
/// into the staging queue, to a dispatch worker and, after a failed delivery,
/// back into the queue, so nothing downstream may edit it in place. Fields are
/// private and exposed through accessors only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(default = "Uuid::new_v4")]
    id: Uuid,
    level: LogLevel,
    logger_name: String,
    message: String,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(default = "current_thread_name")]
    thread_name: String,
    #[serde(default)]
    exception_class: Option<String>,
    #[serde(default)]
    exception_message: Option<String>,
    #[serde(default)]
    marker: Option<String>,
    #[serde(default)]
    context: HashMap<String, String>,
    #[serde(default)]
    time_zone: Option<String>,
}

fn current_thread_name() -> String {
    let thread = std::thread::current();
    match thread.name() {
        Some(name) => name.to_string(),
        None => format!("{:?}", thread.id()),
    }
}

impl LogEvent {
    /// Start building an event. Timestamp and thread name default to "now"
    /// and the calling thread.
    pub fn builder(
        level: LogLevel,
        logger_name: impl Into<String>,
        message: impl Into<String>,
    ) -> LogEventBuilder {
        LogEventBuilder {
            event: LogEvent {
                id: Uuid::new_v4(),
                level,
                logger_name: logger_name.into(),
                message: message.into(),
                timestamp: Utc::now(),
                thread_name: current_thread_name(),
                exception_class: None,
                exception_message: None,
                marker: None,
                context: HashMap::new(),
                time_zone: None,
            },
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    pub fn exception_class(&self) -> Option<&str> {
        self.exception_class.as_deref()
    }

    pub fn exception_message(&self) -> Option<&str> {
        self.exception_message.as_deref()
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    pub fn context(&self) -> &HashMap<String, String> {
        &self.context
    }

    pub fn time_zone(&self) -> Option<&str> {
        self.time_zone.as_deref()
    }
}

#[derive(Debug, Clone)]
pub struct LogEventBuilder {
    event: LogEvent,
}

impl LogEventBuilder {
    pub fn timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.event.timestamp = timestamp;
        self
    }

    pub fn thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.event.thread_name = thread_name.into();
        self
    }

    pub fn exception(
        mut self,
        class_name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        self.event.exception_class = Some(class_name.into());
        self.event.exception_message = Some(message.into());
        self
    }

    pub fn exception_class(mut self, class_name: impl Into<String>) -> Self {
        self.event.exception_class = Some(class_name.into());
        self
    }

    pub fn exception_message(mut self, message: impl Into<String>) -> Self {
        self.event.exception_message = Some(message.into());
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.event.marker = Some(marker.into());
        self
    }

    pub fn context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.event.context.insert(key.into(), value.into());
        self
    }

    pub fn context(mut self, context: HashMap<String, String>) -> Self {
        self.event.context = context;
        self
    }

    pub fn time_zone(mut self, zone_id: impl Into<String>) -> Self {
        self.event.time_zone = Some(zone_id.into());
        self
    }

    pub fn build(self) -> LogEvent {
        self.event
    }
}
