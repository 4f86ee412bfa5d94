use logging::LogLevel;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub log_file_path: String,
    pub log_level: LogLevel,
    pub enable_console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            log_file_path: "peerlink-relay.log".to_string(),
            log_level: LogLevel::Info,
            enable_console: true,
        }
    }
}
