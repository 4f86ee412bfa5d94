use crate::log_level::LogLevel;
use chrono::Local;

/// One formatted-on-demand log record.
#[derive(Debug, Clone)]
pub(crate) struct LogMessage {
    pub timestamp: String,
    pub level: LogLevel,
    pub component: Option<String>,
    pub message: String,
}

impl LogMessage {
    pub fn new(level: LogLevel, component: Option<&str>, message: &str) -> Self {
        Self {
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
            level,
            component: component.map(str::to_owned),
            message: message.to_owned(),
        }
    }

    /// `[timestamp] LEVEL [component]: message`, without a trailing newline.
    pub fn line(&self) -> String {
        match &self.component {
            Some(component) => format!(
                "[{}] {} [{}]: {}",
                self.timestamp, self.level, component, self.message
            ),
            None => format!("[{}] {}: {}", self.timestamp, self.level, self.message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_includes_component() {
        let msg = LogMessage::new(LogLevel::Warn, Some("Registry"), "stale disconnect ignored");
        let line = msg.line();

        assert!(line.contains("WARN [Registry]: stale disconnect ignored"));
        assert!(!line.ends_with('\n'));
    }

    #[test]
    fn test_line_without_component() {
        let msg = LogMessage::new(LogLevel::Info, None, "relay started");
        assert!(msg.line().ends_with("INFO: relay started"));
    }

    #[test]
    fn test_timestamp_format() {
        let msg = LogMessage::new(LogLevel::Info, None, "x");
        // YYYY-MM-DD HH:MM:SS.mmm
        assert_eq!(msg.timestamp.len(), 23);
        assert_eq!(&msg.timestamp[4..5], "-");
        assert_eq!(&msg.timestamp[19..20], ".");
    }
}
