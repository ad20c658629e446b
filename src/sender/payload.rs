use super::transport::{JSON_CONTENT_TYPE, Payload, TransportError};
use crate::domain::{LogEvent, LogLevel};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use flate2::{Compression, write::GzEncoder};
use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;

/// Wire document for one event, as the collector expects it.
///
/// Optional fields that are unset are left out of the document.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GelfMessage<'a> {
    pub message: &'a str,
    pub logger_name: &'a str,
    pub log_level: LogLevel,
    pub log_timestamp: DateTime<Utc>,
    pub thread_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_class: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception_message: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<&'a str>,
    pub context: &'a HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<&'a str>,
}

impl<'a> From<&'a LogEvent> for GelfMessage<'a> {
    fn from(event: &'a LogEvent) -> Self {
        Self {
            message: event.message(),
            logger_name: event.logger_name(),
            log_level: event.level(),
            log_timestamp: event.timestamp(),
            thread_name: event.thread_name(),
            exception_class: event.exception_class(),
            exception_message: event.exception_message(),
            marker: event.marker(),
            context: event.context(),
            time_zone: event.time_zone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PayloadEncoder {
    compress: bool,
}

impl PayloadEncoder {
    pub fn new(compress: bool) -> Self {
        Self { compress }
    }

    pub fn encode(&self, event: &LogEvent) -> Result<Payload, TransportError> {
        let json = serde_json::to_vec(&GelfMessage::from(event))?;

        let (body, content_encoding) = if self.compress {
            let mut encoder =
                GzEncoder::new(Vec::with_capacity(json.len() / 2), Compression::fast());
            encoder.write_all(&json)?;
            (encoder.finish()?, Some("gzip"))
        } else {
            (json, None)
        };

        Ok(Payload {
            event_id: event.id(),
            content_type: JSON_CONTENT_TYPE,
            content_encoding,
            body: Bytes::from(body),
        })
    }
}
