use std::collections::HashMap;
use std::fmt;
use tracing::field::{Field, Visit};

const MESSAGE_FIELD: &str = "message";
const EXCEPTION_CLASS_FIELD: &str = "exception_class";
const EXCEPTION_MESSAGE_FIELD: &str = "exception_message";
const MARKER_FIELD: &str = "marker";

/// Collects the fields of one tracing event into the parts of a `LogEvent`.
///
/// `exception_class`, `exception_message` and `marker` map onto the matching
/// event attributes, `message` becomes the text, and everything else lands in
/// the context map. An error value recorded under any other name fills the
/// exception message if nothing else did.
#[derive(Debug, Default)]
pub(crate) struct EventVisitor {
    pub(crate) message: String,
    pub(crate) exception_class: Option<String>,
    pub(crate) exception_message: Option<String>,
    pub(crate) marker: Option<String>,
    pub(crate) context: HashMap<String, String>,
}

impl EventVisitor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn record_value(&mut self, field: &Field, value: String) {
        match field.name() {
            MESSAGE_FIELD => self.message = value,
            EXCEPTION_CLASS_FIELD => self.exception_class = Some(value),
            EXCEPTION_MESSAGE_FIELD => self.exception_message = Some(value),
            MARKER_FIELD => self.marker = Some(value),
            name => {
                self.context.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EventVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_value(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_value(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_value(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_value(field, value.to_string());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_value(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        let text = value.to_string();
        if self.exception_message.is_none() && field.name() != EXCEPTION_MESSAGE_FIELD {
            self.exception_message = Some(text.clone());
        }
        self.record_value(field, text);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record_value(field, format!("{:?}", value));
    }
}
