use chrono::Utc;
use std::borrow::Cow;
use std::cell::Cell;
use std::error::Error;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;

use crate::diagnostics::DIAGNOSTICS_TARGET;
use crate::handler::TelegramHandler;
use crate::level::Level;
use crate::record::{LogRecord, Message};

/// Targets whose events are never forwarded: this crate's own reports and
/// the HTTP stack used to deliver records.
pub const DEFAULT_IGNORED_TARGETS: &[&str] =
    &[DIAGNOSTICS_TARGET, "hyper", "h2", "reqwest", "rustls", "tokio"];

thread_local! {
    static EMITTING: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside an emit until dropped.
struct EmitGuard;

impl EmitGuard {
    fn enter() -> Option<Self> {
        EMITTING.with(|flag| {
            if flag.get() {
                None
            } else {
                flag.set(true);
                Some(EmitGuard)
            }
        })
    }
}

impl Drop for EmitGuard {
    fn drop(&mut self) {
        EMITTING.with(|flag| flag.set(false));
    }
}

/// `tracing_subscriber` layer that turns events into [`LogRecord`]s and
/// hands them to a [`TelegramHandler`].
///
/// Delivery happens synchronously inside `on_event`. Events at or above
/// the handler threshold are forwarded; events raised while this thread is
/// already delivering one are dropped, as are events from ignored targets.
pub struct TelegramLayer {
    handler: Arc<TelegramHandler>,
    ignored_targets: Vec<Cow<'static, str>>,
}

impl TelegramLayer {
    pub fn new(handler: TelegramHandler) -> Self {
        Self::from_arc(Arc::new(handler))
    }

    pub fn from_arc(handler: Arc<TelegramHandler>) -> Self {
        Self {
            handler,
            ignored_targets: DEFAULT_IGNORED_TARGETS.iter().map(|t| Cow::Borrowed(*t)).collect(),
        }
    }

    /// Also drop events whose target equals `target` or lives below it.
    pub fn ignore_target(mut self, target: impl Into<Cow<'static, str>>) -> Self {
        self.ignored_targets.push(target.into());
        self
    }

    pub fn handler(&self) -> &Arc<TelegramHandler> {
        &self.handler
    }

    fn is_ignored(&self, target: &str) -> bool {
        self.ignored_targets.iter().any(|ignored| {
            target == ignored.as_ref()
                || target
                    .strip_prefix(ignored.as_ref())
                    .map_or(false, |rest| rest.starts_with("::"))
        })
    }
}

impl<S> Layer<S> for TelegramLayer
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let meta = event.metadata();
        let level = Level::from(*meta.level());
        if !self.handler.enabled_for(level) || self.is_ignored(meta.target()) {
            return;
        }
        let Some(_guard) = EmitGuard::enter() else {
            return;
        };

        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let function = ctx
            .event_span(event)
            .map(|span| span.name().to_string());

        let record = LogRecord {
            timestamp: Utc::now(),
            level,
            name: meta.target().to_string(),
            module: meta.module_path().map(|s| s.to_string()),
            function,
            message: visitor.build_message(),
            args: Vec::new(),
            exception: visitor.exception,
            stack: visitor.stack,
        };

        self.handler.emit(&record);
    }
}

/// Collects an event's fields into the parts of a [`LogRecord`].
///
/// `message` becomes the text, `error`/`exception` the exception text,
/// `backtrace`/`stack` the stack text. Other fields are appended to the
/// text as `key=value`, or form a structured message when there is no text.
#[derive(Default)]
pub struct FieldVisitor {
    pub message: Option<String>,
    pub exception: Option<String>,
    pub stack: Option<String>,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl FieldVisitor {
    fn build_message(&self) -> Message {
        match &self.message {
            Some(text) => {
                let mut text = text.clone();
                for (key, value) in &self.fields {
                    match value {
                        serde_json::Value::String(s) => {
                            let _ = write!(text, " {}={}", key, s);
                        }
                        other => {
                            let _ = write!(text, " {}={}", key, other);
                        }
                    }
                }
                Message::Text(text)
            }
            None if self.fields.is_empty() => Message::Text(String::new()),
            None => Message::from(serde_json::Value::Object(self.fields.clone())),
        }
    }

    fn record_text(&mut self, field: &Field, text: String) {
        match field.name() {
            "message" => self.message = Some(text),
            "error" | "exception" => self.exception = Some(text),
            "backtrace" | "stack" => self.stack = Some(text),
            name => {
                self.fields
                    .insert(name.to_string(), serde_json::Value::String(text));
            }
        }
    }
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.insert(field.name().to_string(), serde_json::Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn Error + 'static)) {
        let mut text = value.to_string();
        let mut source = value.source();
        while let Some(cause) = source {
            let _ = write!(text, "\ncaused by: {}", cause);
            source = cause.source();
        }
        self.record_text(field, text);
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_text(field, format!("{:?}", value));
    }
}
