use crate::handler::TelegramHandler;
use crate::layer::TelegramLayer;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::Registry;

/// Configuration of the subscriber installed by [`init_tracing_with_config`].
///
/// **Fields**
/// - `enable_stdout`: if `true`, a `tracing_subscriber::fmt::Layer` is
///   added next to [`TelegramLayer`] so events are also printed locally.
#[derive(Clone, Debug)]
pub struct LayerConfig {
    pub enable_stdout: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            enable_stdout: true,
        }
    }
}

/// Install a global `tracing` subscriber that forwards events to `handler`.
///
/// **Parameters**
/// - `handler`: configured [`TelegramHandler`]; its threshold decides
///   which events reach the chat.
/// - `config`: [`LayerConfig`] controlling the extra console output.
///
/// **Returns**
/// - `Err(..)` if a global default subscriber was already set.
pub fn init_tracing_with_config(
    handler: TelegramHandler,
    config: LayerConfig,
) -> Result<(), SetGlobalDefaultError> {
    let layer = TelegramLayer::new(handler);

    // Both branches build differently typed subscribers.
    if config.enable_stdout {
        let fmt_layer = tracing_subscriber::fmt::layer();
        let subscriber = Registry::default().with(layer).with(fmt_layer);
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = Registry::default().with(layer);
        tracing::subscriber::set_global_default(subscriber)
    }
}

/// Equivalent to [`init_tracing_with_config`] with [`LayerConfig::default`].
pub fn init_tracing(handler: TelegramHandler) -> Result<(), SetGlobalDefaultError> {
    init_tracing_with_config(handler, LayerConfig::default())
}
