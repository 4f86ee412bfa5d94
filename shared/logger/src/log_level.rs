use serde::{Deserialize, Deserializer};
use std::fmt;
use std::str::FromStr;

/// Severity level of a log message.
///
/// Ordered from lowest to highest: Debug < Info < Warn < Error
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = std::convert::Infallible;

    /// Parses a level name case-insensitively. Unknown names fall back to Info
    /// so a typo in a config file never disables logging.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "trace" => LogLevel::Debug,
            "warn" | "warning" => LogLevel::Warn,
            "error" => LogLevel::Error,
            _ => LogLevel::Info,
        })
    }
}

impl<'de> Deserialize<'de> for LogLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let Ok(level) = raw.parse::<LogLevel>();
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> LogLevel {
        let Ok(level) = s.parse::<LogLevel>();
        level
    }

    #[test]
    fn test_log_level_ordering() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Info < LogLevel::Warn);
        assert!(LogLevel::Warn < LogLevel::Error);
    }

    #[test]
    fn test_log_level_from_str_accepts_aliases() {
        assert_eq!(parse("DEBUG"), LogLevel::Debug);
        assert_eq!(parse("trace"), LogLevel::Debug);
        assert_eq!(parse(" Warning "), LogLevel::Warn);
        assert_eq!(parse("error"), LogLevel::Error);
    }

    #[test]
    fn test_log_level_unknown_defaults_to_info() {
        assert_eq!(parse(""), LogLevel::Info);
        assert_eq!(parse("verbose"), LogLevel::Info);
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserializes_from_config_string() {
        let level: LogLevel = serde_json::from_str("\"warn\"").unwrap();
        assert_eq!(level, LogLevel::Warn);

        let level: LogLevel = serde_json::from_str("\"loud\"").unwrap();
        assert_eq!(level, LogLevel::Info);
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(LogLevel::Error.to_string(), "ERROR");
    }
}
