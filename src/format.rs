use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

use crate::html::{escape_html, level_emoji, pre};
use crate::interpolate::interpolate;
use crate::record::{LogRecord, Message};

/// Text style of a rendered record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Plain,
    Markdown,
    #[default]
    Html,
}

/// Text-rendering mode the Bot API is told to apply to a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    Markdown,
    #[serde(rename = "HTML")]
    Html,
}

impl ParseMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ParseMode::Markdown => "Markdown",
            ParseMode::Html => "HTML",
        }
    }
}

impl Style {
    pub fn parse_mode(self) -> Option<ParseMode> {
        match self {
            Style::Plain => None,
            Style::Markdown => Some(ParseMode::Markdown),
            Style::Html => Some(ParseMode::Html),
        }
    }

    pub fn default_template(self) -> &'static str {
        match self {
            Style::Plain => "{level}\n[{name}:{function}]\n{message}",
            Style::Markdown => "*{level}*\n[{name}:{function}]\n{message}",
            Style::Html => "<b>{level}</b>\nFrom [{name}:{function}]\n{message}",
        }
    }

    pub fn default_service_template(self) -> &'static str {
        match self {
            Style::Plain => "{level}\n{service}\n[{name}:{function}]\n{message}",
            Style::Markdown => "*{level}*\n{service}\n[{name}:{function}]\n{message}",
            Style::Html => "<b>{level}</b>\nFrom {service}\n[{name}:{function}]\n{message}",
        }
    }
}

/// Rendering options shared by every record a formatter handles.
///
/// Templates use `{level}`, `{name}`, `{module}`, `{function}`,
/// `{message}`, `{service}` and `{time}` placeholders. The service
/// template is selected whenever a service label is configured.
#[derive(Clone, Debug, Default)]
pub struct FormatConfig {
    pub style: Style,
    pub use_emoji: bool,
    pub service: Option<String>,
    pub template: Option<String>,
    pub service_template: Option<String>,
}

impl FormatConfig {
    pub fn new(style: Style) -> Self {
        FormatConfig {
            style,
            ..FormatConfig::default()
        }
    }

    pub fn plain() -> Self {
        Self::new(Style::Plain)
    }

    pub fn markdown() -> Self {
        Self::new(Style::Markdown)
    }

    pub fn html() -> Self {
        Self::new(Style::Html)
    }

    pub fn with_emoji(mut self, use_emoji: bool) -> Self {
        self.use_emoji = use_emoji;
        self
    }

    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    pub fn with_service_template(mut self, template: impl Into<String>) -> Self {
        self.service_template = Some(template.into());
        self
    }

    fn active_template(&self) -> &str {
        match &self.service {
            Some(_) => self
                .service_template
                .as_deref()
                .unwrap_or_else(|| self.style.default_service_template()),
            None => self
                .template
                .as_deref()
                .unwrap_or_else(|| self.style.default_template()),
        }
    }
}

/// Output of [`render`]: the message text and the parse mode to send it with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rendered {
    pub text: String,
    pub parse_mode: Option<ParseMode>,
}

/// A [`FormatConfig`] bound into a reusable formatter.
#[derive(Clone, Debug, Default)]
pub struct Formatter {
    config: FormatConfig,
}

impl Formatter {
    pub fn new(config: FormatConfig) -> Self {
        Formatter { config }
    }

    pub fn config(&self) -> &FormatConfig {
        &self.config
    }

    pub fn parse_mode(&self) -> Option<ParseMode> {
        self.config.style.parse_mode()
    }

    pub fn render(&self, record: &LogRecord) -> Rendered {
        render(record, &self.config)
    }

    pub fn format(&self, record: &LogRecord) -> String {
        self.render(record).text
    }
}

/// Render `record` according to `config`.
///
/// Never fails: structured values that do not serialize fall back to their
/// `Debug` form and messages whose arguments do not match keep their raw
/// text.
pub fn render(record: &LogRecord, config: &FormatConfig) -> Rendered {
    let style = config.style;
    let html = style == Style::Html;
    let escape = |text: &str| -> String {
        if html {
            escape_html(text)
        } else {
            text.to_string()
        }
    };

    let mut level = escape(&record.level.name());
    if config.use_emoji {
        level = format!("{} {}", level_emoji(record.level), level);
    }

    let message = escape(&message_text(record, style));
    let name = escape(&record.name);
    let module = escape(record.module.as_deref().unwrap_or(""));
    let function = escape(record.function.as_deref().unwrap_or("<module>"));
    let service = escape(config.service.as_deref().unwrap_or("logs"));
    let time = record.timestamp.format("%Y-%m-%d %H:%M:%S").to_string();

    let mut text = substitute(config.active_template(), |placeholder| match placeholder {
        "level" => Some(level.as_str()),
        "name" => Some(name.as_str()),
        "module" => Some(module.as_str()),
        "function" => Some(function.as_str()),
        "message" => Some(message.as_str()),
        "service" => Some(service.as_str()),
        "time" => Some(time.as_str()),
        _ => None,
    });

    if let Some(exception) = &record.exception {
        append_block(&mut text, &format_exception(exception, style));
    }
    if let Some(stack) = &record.stack {
        append_block(&mut text, &format_stack(stack, style));
    }

    Rendered {
        text,
        parse_mode: style.parse_mode(),
    }
}

fn message_text(record: &LogRecord, style: Style) -> String {
    let text: Cow<'_, str> = match &record.message {
        Message::Text(text) => Cow::Borrowed(text.as_str()),
        Message::Structured(structured) => Cow::Owned(match (&structured.json, style) {
            (Some(json), Style::Html) => pretty_json(json).unwrap_or_else(|| structured.debug.clone()),
            (Some(json), _) => json.to_string(),
            (None, _) => structured.debug.clone(),
        }),
    };

    if record.args.is_empty() {
        return text.into_owned();
    }
    interpolate(&text, &record.args).unwrap_or_else(|_| text.into_owned())
}

/// 4-space indented JSON, non-ASCII characters kept as is.
fn pretty_json(value: &Value) -> Option<String> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut serializer).ok()?;
    String::from_utf8(buf).ok()
}

fn format_exception(exception: &str, style: Style) -> String {
    match style {
        Style::Plain => exception.to_string(),
        Style::Markdown => format!("```\n{}\n```", exception),
        Style::Html => pre(exception),
    }
}

fn format_stack(stack: &str, style: Style) -> String {
    match style {
        Style::Html => pre(stack),
        _ => stack.to_string(),
    }
}

fn append_block(text: &mut String, block: &str) {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(block);
}

/// Replace `{placeholder}` occurrences; unknown ones are left untouched.
fn substitute<'a>(template: &str, lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match lookup(key) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
