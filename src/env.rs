//! Environment-based configuration for services that prefer not to wire
//! the handler up in code.
//!
//! These are purely helpers; [`TelegramHandler`](crate::handler::TelegramHandler)
//! itself never reads the environment.

use serde::Deserialize;
use std::time::Duration;

use crate::config::DeliveryConfig;
use crate::format::{FormatConfig, Formatter, Style};
use crate::handler::TelegramHandlerBuilder;
use crate::http::Proxies;
use crate::level::Level;

/// Bot token.
pub const TELEGRAM_LOGGER_TOKEN_ENV: &str = "TELEGRAM_LOGGER_TOKEN";

/// Target chat id.
pub const TELEGRAM_LOGGER_CHAT_ID_ENV: &str = "TELEGRAM_LOGGER_CHAT_ID";

/// Delivery switch: `1`, `true`, `yes` or `on` enable it.
pub const MESSENGERS_LOGGER_ENABLE_ENV: &str = "MESSENGERS_LOGGER_ENABLE";

/// Optional JSON object with [`HandlerOptions`].
pub const MESSENGERS_LOGGER_CONFIG_ENV: &str = "MESSENGERS_LOGGER_CONFIG";

/// Read an environment variable or fall back to a provided default.
pub fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Interpret a switch value.
pub fn env_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Error type returned when the environment holds invalid settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("MESSENGERS_LOGGER_CONFIG is not a valid options object: {0}")]
    InvalidOptions(#[source] serde_json::Error),

    #[error("timeout_secs must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),
}

/// Optional overrides read from [`MESSENGERS_LOGGER_CONFIG_ENV`].
///
/// Unknown keys are rejected so that typos surface at startup.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerOptions {
    pub level: Option<Level>,
    pub service: Option<String>,
    pub timeout_secs: Option<f64>,
    pub proxies: Option<Proxies>,
    pub disable_notification: Option<bool>,
    pub disable_web_page_preview: Option<bool>,
    pub api_endpoint: Option<String>,
    pub style: Option<Style>,
    pub use_emoji: Option<bool>,
}

impl HandlerOptions {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::InvalidOptions)
    }

    /// Apply the overrides to `builder`.
    ///
    /// Setting `style` or `use_emoji` replaces the default formatter with
    /// one built from these options; `service` is kept either way.
    pub fn apply(self, mut builder: TelegramHandlerBuilder) -> Result<TelegramHandlerBuilder, ConfigError> {
        {
            let config = builder.config_mut();
            if let Some(secs) = self.timeout_secs {
                if !secs.is_finite() || secs <= 0.0 {
                    return Err(ConfigError::InvalidTimeout(secs));
                }
                config.timeout = Duration::from_secs_f64(secs);
            }
            if let Some(proxies) = self.proxies {
                config.proxies = proxies;
            }
            if let Some(flag) = self.disable_notification {
                config.disable_notification = flag;
            }
            if let Some(flag) = self.disable_web_page_preview {
                config.disable_web_page_preview = flag;
            }
            if let Some(endpoint) = self.api_endpoint {
                config.api_endpoint = endpoint;
            }
        }

        if let Some(level) = self.level {
            builder = builder.level(level);
        }

        if self.style.is_some() || self.use_emoji.is_some() {
            let mut format = FormatConfig::new(self.style.unwrap_or_default())
                .with_emoji(self.use_emoji.unwrap_or(true));
            format.service = self.service.clone();
            builder = builder.formatter(Formatter::new(format));
        }
        if let Some(service) = self.service {
            builder = builder.service(service);
        }
        Ok(builder)
    }
}

/// Build a handler builder from the process environment.
pub fn builder_from_env() -> Result<TelegramHandlerBuilder, ConfigError> {
    builder_from_lookup(|key| std::env::var(key).ok())
}

/// Build a handler builder from an arbitrary key lookup.
///
/// Reads the token, chat id, enable switch and the JSON options; missing
/// values fall back to [`DeliveryConfig::default`].
pub fn builder_from_lookup<F>(lookup: F) -> Result<TelegramHandlerBuilder, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = DeliveryConfig {
        token: lookup(TELEGRAM_LOGGER_TOKEN_ENV).unwrap_or_default(),
        chat_id: lookup(TELEGRAM_LOGGER_CHAT_ID_ENV),
        enabled: lookup(MESSENGERS_LOGGER_ENABLE_ENV)
            .map(|v| env_flag(&v))
            .unwrap_or(false),
        ..DeliveryConfig::default()
    };

    let builder = TelegramHandlerBuilder::new(config);
    match lookup(MESSENGERS_LOGGER_CONFIG_ENV) {
        Some(json) if !json.trim().is_empty() => HandlerOptions::from_json(&json)?.apply(builder),
        _ => Ok(builder),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags() {
        assert!(env_flag("TRUE"));
        assert!(env_flag(" 1 "));
        assert!(!env_flag("0"));
        assert!(!env_flag(""));
    }

    #[test]
    fn options_parse() {
        let options = HandlerOptions::from_json(
            r#"{"level": "warning", "timeout_secs": 5, "proxies": {"https": "http://proxy:3128"}, "style": "markdown"}"#,
        )
        .unwrap();
        assert_eq!(options.level, Some(Level::WARNING));
        assert_eq!(options.timeout_secs, Some(5.0));
        assert_eq!(options.proxies.unwrap().https.as_deref(), Some("http://proxy:3128"));
        assert_eq!(options.style, Some(Style::Markdown));
    }

    #[test]
    fn options_reject_unknown_keys() {
        assert!(matches!(
            HandlerOptions::from_json(r#"{"silent": true}"#),
            Err(ConfigError::InvalidOptions(_))
        ));
    }

    #[test]
    fn rejects_non_positive_timeout() {
        let options = HandlerOptions {
            timeout_secs: Some(0.0),
            ..HandlerOptions::default()
        };
        let builder = TelegramHandlerBuilder::new(DeliveryConfig::default());
        assert!(matches!(options.apply(builder), Err(ConfigError::InvalidTimeout(_))));
    }
}
