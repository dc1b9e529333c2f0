use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::format::ParseMode;

/// Default Bot API base URL.
pub const API_ENDPOINT: &str = "https://api.telegram.org";

/// Longest text sent as a regular message; longer texts become documents.
pub const MAX_MESSAGE_LEN: usize = 4096;

/// Characters of a long text kept as the caption of its document.
pub const MAX_CAPTION_LEN: usize = 1000;

pub const DOCUMENT_FILE_NAME: &str = "traceback.txt";

/// Bot API methods used by the handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiMethod {
    SendMessage,
    SendDocument,
    GetUpdates,
}

impl ApiMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ApiMethod::SendMessage => "sendMessage",
            ApiMethod::SendDocument => "sendDocument",
            ApiMethod::GetUpdates => "getUpdates",
        }
    }
}

/// `{endpoint}/bot{token}/{method}`
pub fn format_url(endpoint: &str, token: &str, method: ApiMethod) -> String {
    format!("{}/bot{}/{}", endpoint.trim_end_matches('/'), token, method.as_str())
}

/// A single outbound call, ready for a [`Transport`](crate::transport::Transport).
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: ApiMethod,
    pub url: String,
    pub timeout: Duration,
    pub payload: Payload,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Empty,
    Json(Value),
    Multipart {
        fields: Vec<(String, String)>,
        document: Document,
    },
}

/// File attached to a `sendDocument` call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    pub file_name: String,
    pub mime: String,
    pub content: Vec<u8>,
}

impl Document {
    pub fn text(content: impl Into<Vec<u8>>) -> Self {
        Document {
            file_name: DOCUMENT_FILE_NAME.to_string(),
            mime: "text/plain".to_string(),
            content: content.into(),
        }
    }
}

/// Parameters shared by `sendMessage` and `sendDocument`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SendParams {
    pub chat_id: String,
    pub disable_notification: bool,
    pub disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

impl SendParams {
    /// Same parameters as multipart form fields.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("chat_id".to_string(), self.chat_id.clone()),
            ("disable_notification".to_string(), self.disable_notification.to_string()),
            ("disable_web_page_preview".to_string(), self.disable_web_page_preview.to_string()),
        ];
        if let Some(mode) = self.parse_mode {
            fields.push(("parse_mode".to_string(), mode.as_str().to_string()));
        }
        fields
    }
}

#[derive(Serialize)]
struct MessageBody<'a> {
    text: &'a str,
    #[serde(flatten)]
    params: &'a SendParams,
}

/// JSON body of a `sendMessage` call.
pub fn message_payload(text: &str, params: &SendParams) -> Payload {
    let body = MessageBody { text, params };
    Payload::Json(serde_json::to_value(body).unwrap_or(Value::Null))
}

/// Multipart body of a `sendDocument` call.
pub fn document_payload(caption: &str, document: Document, params: &SendParams) -> Payload {
    let mut fields = vec![("caption".to_string(), caption.to_string())];
    fields.extend(params.form_fields());
    Payload::Multipart { fields, document }
}

/// Whether a response body reports `"ok": true`.
pub fn is_ok(response: &Value) -> bool {
    response.get("ok").and_then(Value::as_bool).unwrap_or(false)
}

/// Depth-first search for the first value stored under `key`.
///
/// Keys of the current object are checked before descending into nested
/// objects, in document order. Arrays are not traversed.
pub fn find_key<'a>(key: &str, data: &'a Value) -> Option<&'a Value> {
    let map = data.as_object()?;
    if let Some(value) = map.get(key) {
        return Some(value);
    }
    map.values()
        .filter(|value| value.is_object())
        .find_map(|value| find_key(key, value))
}

/// First `n` characters of `text`.
pub fn truncate_chars(text: &str, n: usize) -> &str {
    match text.char_indices().nth(n) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
