use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Numeric log severity.
///
/// Levels are ordered by value, so a handler threshold is a plain
/// comparison. Besides the named constants any custom value is allowed;
/// such levels display as `Level <n>`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "LevelRepr")]
pub struct Level(u8);

impl Level {
    /// Lowest threshold; every record passes.
    pub const NOTSET: Level = Level(0);
    pub const TRACE: Level = Level(5);
    pub const DEBUG: Level = Level(10);
    pub const INFO: Level = Level(20);
    pub const WARNING: Level = Level(30);
    pub const ERROR: Level = Level(40);
    pub const CRITICAL: Level = Level(50);
    pub const FATAL: Level = Level::CRITICAL;

    pub const fn new(value: u8) -> Self {
        Level(value)
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    /// Display name used in rendered messages.
    pub fn name(self) -> Cow<'static, str> {
        match self {
            Level::NOTSET => Cow::Borrowed("NOTSET"),
            Level::TRACE => Cow::Borrowed("TRACE"),
            Level::DEBUG => Cow::Borrowed("DEBUG"),
            Level::INFO => Cow::Borrowed("INFO"),
            Level::WARNING => Cow::Borrowed("WARNING"),
            Level::ERROR => Cow::Borrowed("ERROR"),
            Level::CRITICAL => Cow::Borrowed("CRITICAL"),
            Level(other) => Cow::Owned(format!("Level {}", other)),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::TRACE,
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::WARN => Level::WARNING,
            tracing::Level::ERROR => Level::ERROR,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown log level: {0:?}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_uppercase().as_str() {
            "NOTSET" => Ok(Level::NOTSET),
            "TRACE" => Ok(Level::TRACE),
            "DEBUG" => Ok(Level::DEBUG),
            "INFO" => Ok(Level::INFO),
            "WARN" | "WARNING" => Ok(Level::WARNING),
            "ERROR" => Ok(Level::ERROR),
            "CRITICAL" | "FATAL" => Ok(Level::CRITICAL),
            _ => trimmed
                .parse::<u8>()
                .map(Level)
                .map_err(|_| ParseLevelError(s.to_string())),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LevelRepr {
    Value(u8),
    Name(String),
}

impl TryFrom<LevelRepr> for Level {
    type Error = ParseLevelError;

    fn try_from(repr: LevelRepr) -> Result<Self, Self::Error> {
        match repr {
            LevelRepr::Value(value) => Ok(Level(value)),
            LevelRepr::Name(name) => name.parse(),
        }
    }
}
