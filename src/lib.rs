pub mod level;
pub mod record;
pub mod html;
pub mod interpolate;
pub mod format;
pub mod api;
pub mod transport;
pub mod http;
pub mod noop_transport;
pub mod diagnostics;
pub mod config;
pub mod handler;
pub mod layer;

pub mod init;
pub mod env;

pub use config::DeliveryConfig;
pub use format::{render, FormatConfig, Formatter, ParseMode, Rendered, Style};
pub use handler::{TelegramHandler, TelegramHandlerBuilder};
pub use layer::TelegramLayer;
pub use level::Level;
pub use record::{LogRecord, Message};
pub use transport::{Transport, TransportError};
