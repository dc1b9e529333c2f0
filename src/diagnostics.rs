use crate::level::Level;

/// Target used for events emitted by [`TracingDiagnostics`].
///
/// [`TelegramLayer`](crate::layer::TelegramLayer) ignores this target so
/// that the handler's own reports never loop back into the chat.
pub const DIAGNOSTICS_TARGET: &str = "telegram_log_sink";

/// Local sink for the handler's own reports: disabled delivery, missing
/// chat id, failed requests and `ok: false` responses.
///
/// Injected at handler construction. Implementations must not call back
/// into the handler.
pub trait Diagnostics: Send + Sync {
    fn log(&self, level: Level, message: &str);
}

/// Writes reports at or above a threshold to stderr.
#[derive(Clone, Debug)]
pub struct StderrDiagnostics {
    pub min_level: Level,
}

impl Default for StderrDiagnostics {
    fn default() -> Self {
        Self {
            min_level: Level::WARNING,
        }
    }
}

impl Diagnostics for StderrDiagnostics {
    fn log(&self, level: Level, message: &str) {
        if level >= self.min_level {
            eprintln!("[{}] {}: {}", DIAGNOSTICS_TARGET, level, message);
        }
    }
}

/// Forwards reports to `tracing` under [`DIAGNOSTICS_TARGET`].
#[derive(Clone, Debug, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn log(&self, level: Level, message: &str) {
        if level >= Level::ERROR {
            tracing::error!(target: DIAGNOSTICS_TARGET, "{}", message);
        } else if level >= Level::WARNING {
            tracing::warn!(target: DIAGNOSTICS_TARGET, "{}", message);
        } else if level >= Level::INFO {
            tracing::info!(target: DIAGNOSTICS_TARGET, "{}", message);
        } else if level >= Level::DEBUG {
            tracing::debug!(target: DIAGNOSTICS_TARGET, "{}", message);
        } else {
            tracing::trace!(target: DIAGNOSTICS_TARGET, "{}", message);
        }
    }
}
