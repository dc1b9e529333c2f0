use std::time::Duration;

use crate::api::API_ENDPOINT;
use crate::http::Proxies;

/// Connection and delivery settings of a [`TelegramHandler`](crate::handler::TelegramHandler).
///
/// **Fields**
/// - `token`: bot token, placed in the request path.
/// - `chat_id`: target chat. A handler without one never delivers.
/// - `enabled`: master switch; disabled handlers only log locally.
/// - `timeout`: per-request timeout.
/// - `proxies`: optional HTTP/HTTPS proxy URLs.
/// - `disable_notification`: deliver silently.
/// - `disable_web_page_preview`: suppress link previews.
/// - `api_endpoint`: Bot API base URL, e.g. a self-hosted server.
#[derive(Clone, Debug)]
pub struct DeliveryConfig {
    pub token: String,
    pub chat_id: Option<String>,
    pub enabled: bool,
    pub timeout: Duration,
    pub proxies: Proxies,
    pub disable_notification: bool,
    pub disable_web_page_preview: bool,
    pub api_endpoint: String,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            chat_id: None,
            enabled: false,
            timeout: Duration::from_secs(2),
            proxies: Proxies::default(),
            disable_notification: false,
            disable_web_page_preview: false,
            api_endpoint: API_ENDPOINT.to_string(),
        }
    }
}

impl DeliveryConfig {
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            chat_id: Some(chat_id.into()),
            ..Self::default()
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The chat id, if present and not blank.
    pub fn target(&self) -> Option<&str> {
        self.chat_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
