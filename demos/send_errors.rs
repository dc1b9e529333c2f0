use std::sync::Arc;

use tracing::{error, info, warn};
use telegram_log_sink::diagnostics::StderrDiagnostics;
use telegram_log_sink::env::{builder_from_env, env_or};
use telegram_log_sink::init::init_tracing;
use telegram_log_sink::Level;

/// Reads `TELEGRAM_LOGGER_TOKEN`, `TELEGRAM_LOGGER_CHAT_ID` and
/// `MESSENGERS_LOGGER_ENABLE=1` from the environment and sends a few
/// events to the chat. Without them the handler only reports locally.
#[tracing::instrument]
fn charge_card(order_id: u64) {
    let err = std::io::Error::new(std::io::ErrorKind::TimedOut, "payment gateway timed out");
    error!(order_id, error = %err, "charge failed");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let service = env_or("SERVICE_NAME", "demo");
    let handler = builder_from_env()?
        .level(Level::WARNING)
        .service(service)
        .diagnostics(Arc::new(StderrDiagnostics { min_level: Level::INFO }))
        .build()?;
    init_tracing(handler)?;

    info!("demo started; not forwarded below WARNING");
    warn!(queue = "emails", depth = 1200, "queue is backing up");
    charge_card(42);
    error!(target: "reports", rows = 3, user = "<admin>", "export produced an empty file");
    Ok(())
}
