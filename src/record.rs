use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Debug;

use crate::level::Level;

/// A single log event as seen by the formatter.
///
/// Records are built either by [`TelegramLayer`](crate::layer::TelegramLayer)
/// from `tracing` events or directly by callers through the `with_*`
/// methods.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    /// Logger name; the event target for `tracing` events.
    pub name: String,
    pub module: Option<String>,
    pub function: Option<String>,
    pub message: Message,
    /// Arguments for `%`-style interpolation of a text message.
    pub args: Vec<serde_json::Value>,
    pub exception: Option<String>,
    pub stack: Option<String>,
}

impl LogRecord {
    pub fn new(level: Level, name: impl Into<String>, message: impl Into<Message>) -> Self {
        LogRecord {
            timestamp: Utc::now(),
            level,
            name: name.into(),
            module: None,
            function: None,
            message: message.into(),
            args: Vec::new(),
            exception: None,
            stack: None,
        }
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn with_args(mut self, args: Vec<serde_json::Value>) -> Self {
        self.args = args;
        self
    }

    pub fn with_exception(mut self, exception: impl Into<String>) -> Self {
        self.exception = Some(exception.into());
        self
    }

    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Record payload: free text or a structured value.
#[derive(Debug, Clone)]
pub enum Message {
    Text(String),
    Structured(StructuredMessage),
}

impl Message {
    /// Capture a structured value.
    ///
    /// The JSON form is kept when `value` serializes; the pretty `Debug`
    /// form is always kept and used when it does not.
    pub fn structured<T: Serialize + Debug + ?Sized>(value: &T) -> Self {
        Message::Structured(StructuredMessage {
            json: serde_json::to_value(value).ok(),
            debug: format!("{:#?}", value),
        })
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Message {
    fn from(value: serde_json::Value) -> Self {
        let debug = format!("{:#?}", value);
        Message::Structured(StructuredMessage { json: Some(value), debug })
    }
}

#[derive(Debug, Clone)]
pub struct StructuredMessage {
    pub json: Option<serde_json::Value>,
    pub debug: String,
}
