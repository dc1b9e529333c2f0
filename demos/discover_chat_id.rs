use telegram_log_sink::env::builder_from_env;

/// Prints the chat id of the last message the bot received.
///
/// Send any message to the bot (or add it to a group) first, then run
/// with `TELEGRAM_LOGGER_TOKEN` set.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let handler = builder_from_env()?.build()?;
    match handler.discover_chat_id() {
        Some(chat_id) => println!("TELEGRAM_LOGGER_CHAT_ID={}", chat_id),
        None => eprintln!("no chat found in recent updates"),
    }
    Ok(())
}
