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
            log_file_path: "peerlink-client.log".to_string(),
            log_level: LogLevel::Info,
            enable_console: false,
        }
    }
}

impl LoggingConfig {
    /// Opens the configured log file and starts its writer thread.
    pub fn build_logger(&self) -> logging::Result<logging::Logger> {
        logging::Logger::new(
            std::path::Path::new(&self.log_file_path),
            self.log_level,
            self.enable_console,
        )
    }
}
