#![allow(dead_code)]

use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use telegram_log_sink::api::{ApiMethod, ApiRequest};
use telegram_log_sink::diagnostics::Diagnostics;
use telegram_log_sink::transport::{Transport, TransportError};
use telegram_log_sink::{DeliveryConfig, Level, TelegramHandler, TelegramHandlerBuilder};

/// Outcome a [`RecordingTransport`] gives every request.
#[derive(Clone)]
pub enum Reply {
    Body(Value),
    Status(u16, String),
}

/// Transport that stores each request and answers with a fixed reply.
pub struct RecordingTransport {
    pub requests: Mutex<Vec<ApiRequest>>,
    reply: Reply,
}

impl RecordingTransport {
    pub fn ok() -> Arc<Self> {
        Self::replying(Reply::Body(json!({"ok": true, "result": {"message_id": 1}})))
    }

    pub fn replying(reply: Reply) -> Arc<Self> {
        Arc::new(Self {
            requests: Mutex::new(Vec::new()),
            reply,
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: ApiMethod) -> usize {
        self.requests().iter().filter(|r| r.method == method).count()
    }
}

impl Transport for RecordingTransport {
    fn post(&self, request: &ApiRequest) -> Result<Value, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            Reply::Body(body) => Ok(body.clone()),
            Reply::Status(status, body) => Err(TransportError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

/// Diagnostics sink that keeps every report in memory.
#[derive(Default)]
pub struct MemoryDiagnostics {
    pub entries: Mutex<Vec<(Level, String)>>,
}

impl MemoryDiagnostics {
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().unwrap().clone()
    }

    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn log(&self, level: Level, message: &str) {
        self.entries.lock().unwrap().push((level, message.to_string()));
    }
}

pub fn enabled_config() -> DeliveryConfig {
    DeliveryConfig::new("123:abc", "-100500").enabled(true)
}

pub fn builder(
    config: DeliveryConfig,
    transport: &Arc<RecordingTransport>,
    diagnostics: &Arc<MemoryDiagnostics>,
) -> TelegramHandlerBuilder {
    TelegramHandler::builder(config)
        .transport(transport.clone())
        .diagnostics(diagnostics.clone())
}
