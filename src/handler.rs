use serde_json::Value;
use std::sync::Arc;

use crate::api::{
    document_payload, find_key, format_url, is_ok, message_payload, truncate_chars, ApiMethod,
    ApiRequest, Document, Payload, SendParams, MAX_CAPTION_LEN, MAX_MESSAGE_LEN,
};
use crate::config::DeliveryConfig;
use crate::diagnostics::{Diagnostics, StderrDiagnostics};
use crate::format::{FormatConfig, Formatter, Rendered};
use crate::http::HttpTransport;
use crate::level::Level;
use crate::record::LogRecord;
use crate::transport::{Transport, TransportError};

/// Renders records and delivers them to a Telegram chat.
///
/// Every call is synchronous and best effort: at most one HTTP request
/// per record, no retries, and failures are reported through the
/// injected [`Diagnostics`] instead of being returned.
pub struct TelegramHandler {
    config: DeliveryConfig,
    /// `None` means no record passes.
    threshold: Option<Level>,
    formatter: Option<Formatter>,
    default_formatter: Formatter,
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl TelegramHandler {
    pub fn builder(config: DeliveryConfig) -> TelegramHandlerBuilder {
        TelegramHandlerBuilder::new(config)
    }

    pub fn config(&self) -> &DeliveryConfig {
        &self.config
    }

    /// Effective threshold; `None` when the handler has no chat id.
    pub fn threshold(&self) -> Option<Level> {
        self.threshold
    }

    pub fn enabled_for(&self, level: Level) -> bool {
        self.threshold.map_or(false, |threshold| level >= threshold)
    }

    /// The formatter used for records: the explicit override, if any,
    /// otherwise the default one.
    pub fn formatter(&self) -> &Formatter {
        self.formatter.as_ref().unwrap_or(&self.default_formatter)
    }

    pub fn format(&self, record: &LogRecord) -> Rendered {
        self.formatter().render(record)
    }

    /// Apply the threshold, then [`emit`](Self::emit).
    pub fn handle(&self, record: &LogRecord) {
        if self.enabled_for(record.level) {
            self.emit(record);
        }
    }

    /// Render and deliver `record`.
    ///
    /// Texts shorter than [`MAX_MESSAGE_LEN`] characters go out as a
    /// message; longer ones as a `traceback.txt` document captioned with
    /// their first [`MAX_CAPTION_LEN`] characters.
    pub fn emit(&self, record: &LogRecord) {
        let rendered = self.format(record);

        if !self.config.enabled {
            self.diagnostics
                .log(Level::INFO, &format!("TelegramHandler disabled:\n{}", rendered.text));
            return;
        }

        let Some(chat_id) = self.config.target() else {
            self.diagnostics
                .log(Level::WARNING, &format!("TelegramHandler without chat_id:\n{}", rendered.text));
            return;
        };

        let params = SendParams {
            chat_id: chat_id.to_string(),
            disable_notification: self.config.disable_notification,
            disable_web_page_preview: self.config.disable_web_page_preview,
            parse_mode: rendered.parse_mode,
        };

        let response = if rendered.text.chars().count() < MAX_MESSAGE_LEN {
            self.send_message(&rendered.text, &params)
        } else {
            let caption = truncate_chars(&rendered.text, MAX_CAPTION_LEN);
            self.send_document(caption, Document::text(rendered.text.as_bytes()), &params)
        };

        if let Some(response) = response {
            if !is_ok(&response) {
                self.diagnostics.log(
                    Level::WARNING,
                    &format!("Telegram responded with ok=false status! {}", response),
                );
            }
        }
    }

    pub fn send_message(&self, text: &str, params: &SendParams) -> Option<Value> {
        self.request(ApiMethod::SendMessage, message_payload(text, params))
    }

    pub fn send_document(&self, caption: &str, document: Document, params: &SendParams) -> Option<Value> {
        self.request(ApiMethod::SendDocument, document_payload(caption, document, params))
    }

    /// Perform one Bot API call.
    ///
    /// **Returns**
    /// - `Some(body)` when the endpoint answered with a 2xx JSON body.
    /// - `None` on any [`TransportError`], after logging the URL, the
    ///   error, the request payload and the response body if there was one.
    pub fn request(&self, method: ApiMethod, payload: Payload) -> Option<Value> {
        let request = ApiRequest {
            method,
            url: format_url(&self.config.api_endpoint, &self.config.token, method),
            timeout: self.config.timeout,
            payload,
        };

        match self.transport.post(&request) {
            Ok(body) => Some(body),
            Err(err) => {
                self.report_failure(&request, &err);
                None
            }
        }
    }

    fn report_failure(&self, request: &ApiRequest, err: &TransportError) {
        self.diagnostics.log(
            Level::ERROR,
            &format!("Error while making POST to {}: {}", self.redacted_url(request.method), err),
        );
        self.diagnostics
            .log(Level::DEBUG, &format!("request payload: {:?}", request.payload));
        if let Some(body) = err.response_body() {
            self.diagnostics.log(Level::DEBUG, &format!("response body: {}", body));
        }
    }

    fn redacted_url(&self, method: ApiMethod) -> String {
        format_url(&self.config.api_endpoint, "<token>", method)
    }

    /// Look up the chat id of the most recent update the bot received.
    ///
    /// Meant for bootstrapping a configuration: send any message to the bot,
    /// then call this once.
    pub fn discover_chat_id(&self) -> Option<String> {
        let response = match self.request(ApiMethod::GetUpdates, Payload::Empty) {
            Some(response) if is_ok(&response) => response,
            other => {
                self.diagnostics.log(
                    Level::ERROR,
                    &format!("Telegram response is not ok: {:?}", other),
                );
                return None;
            }
        };

        let chat_id = response
            .get("result")
            .and_then(Value::as_array)
            .and_then(|updates| updates.last())
            .and_then(|update| find_key("chat", update))
            .and_then(|chat| chat.get("id"));

        match chat_id {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => {
                self.diagnostics
                    .log(Level::ERROR, "Error on getting chat id from last response");
                self.diagnostics.log(Level::DEBUG, &response.to_string());
                None
            }
        }
    }
}

/// Builder for [`TelegramHandler`].
///
/// Unless overridden, records are rendered with an HTML formatter using
/// level emoji and the configured service label, sent through an
/// [`HttpTransport`], and reports go to [`StderrDiagnostics`].
pub struct TelegramHandlerBuilder {
    config: DeliveryConfig,
    level: Level,
    service: Option<String>,
    formatter: Option<Formatter>,
    transport: Option<Arc<dyn Transport>>,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl TelegramHandlerBuilder {
    pub fn new(config: DeliveryConfig) -> Self {
        Self {
            config,
            level: Level::NOTSET,
            service: None,
            formatter: None,
            transport: None,
            diagnostics: None,
        }
    }

    /// Lowest level delivered by [`TelegramHandler::handle`].
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Service label shown by the default formatter.
    pub fn service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Replace the default formatter.
    pub fn formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn Diagnostics>) -> Self {
        self.diagnostics = Some(diagnostics);
        self
    }

    pub fn config_mut(&mut self) -> &mut DeliveryConfig {
        &mut self.config
    }

    /// Finish the handler.
    ///
    /// A missing or blank chat id is not an error: it is reported once and
    /// the handler is built with a threshold no record passes.
    ///
    /// **Returns**
    /// - `Err(..)` only when the default [`HttpTransport`] cannot be built.
    pub fn build(self) -> Result<TelegramHandler, TransportError> {
        let diagnostics = self
            .diagnostics
            .unwrap_or_else(|| Arc::new(StderrDiagnostics::default()));

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.config.proxies)?),
        };

        let threshold = match self.config.target() {
            Some(chat_id) => {
                diagnostics.log(Level::INFO, &format!("TelegramHandler: Chat id: {}", chat_id));
                Some(self.level)
            }
            None => {
                diagnostics.log(
                    Level::ERROR,
                    "Did not get chat id. TelegramHandler will not deliver any records.",
                );
                None
            }
        };

        let mut default_config = FormatConfig::html().with_emoji(true);
        default_config.service = self.service;

        Ok(TelegramHandler {
            config: self.config,
            threshold,
            formatter: self.formatter,
            default_formatter: Formatter::new(default_config),
            transport,
            diagnostics,
        })
    }
}
