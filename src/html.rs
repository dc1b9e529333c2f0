use crate::level::Level;

pub const WHITE_CIRCLE: &str = "\u{26AA}";
pub const BLUE_CIRCLE: &str = "\u{1F535}";
pub const RED_CIRCLE: &str = "\u{1F534}";
pub const ORANGE_CIRCLE: &str = "\u{1F7E0}";
pub const BLACK_CIRCLE: &str = "\u{26AB}";

/// Glyph for levels missing from [`level_emoji`]'s table.
pub const DEFAULT_LEVEL_EMOJI: &str = RED_CIRCLE;

/// Escape the characters the Bot API treats as HTML markup.
///
/// `&` is replaced first so the entities produced for `<` and `>` are not
/// escaped again.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Severity glyph for an exact level, or [`DEFAULT_LEVEL_EMOJI`].
pub fn level_emoji(level: Level) -> &'static str {
    match level {
        Level::DEBUG => WHITE_CIRCLE,
        Level::INFO => BLUE_CIRCLE,
        Level::WARNING => ORANGE_CIRCLE,
        Level::ERROR => RED_CIRCLE,
        Level::CRITICAL => BLACK_CIRCLE,
        _ => DEFAULT_LEVEL_EMOJI,
    }
}

/// Escape `text` and wrap it in a `<pre>` block.
pub fn pre(text: &str) -> String {
    format!("<pre>{}</pre>", escape_html(text))
}
