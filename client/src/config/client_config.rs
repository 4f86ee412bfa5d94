use serde::Deserialize;

use crate::config::{LoggingConfig, RelayEndpoint, SessionConfig, TransferConfig};

pub const DEFAULT_CONFIG_FILE: &str = "client_config.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub relay: RelayEndpoint,
    pub transfer: TransferConfig,
    pub session: SessionConfig,
    pub logging: LoggingConfig,
}

impl ClientConfig {
    pub fn load_from_file(path: &str) -> config_loader::Result<Self> {
        config_loader::load_json(path)
    }

    /// Looks for `client_config.json` in the usual config locations.
    pub fn discover() -> config_loader::Result<Self> {
        config_loader::find_and_load(DEFAULT_CONFIG_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logging::LogLevel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "relay": {{ "address": "relay.example", "auth_token": "t0k" }},
                 "transfer": {{ "stale_transfer_secs": 60 }},
                 "logging": {{ "log_level": "debug" }} }}"#
        )
        .unwrap();

        let config = ClientConfig::load_from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.relay.addr(), "relay.example:8443");
        assert_eq!(config.relay.auth_token, "t0k");
        assert_eq!(config.transfer.chunk_size, 16 * 1024);
        assert_eq!(config.transfer.max_buffered_amount, 64 * 1024);
        assert_eq!(config.transfer.stale_transfer_age().as_secs(), 60);
        assert_eq!(config.session.negotiation_timeout().as_secs(), 30);
        assert_eq!(config.logging.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let result = ClientConfig::load_from_file("/definitely/not/here.json");
        assert!(matches!(result, Err(config_loader::ConfigError::FileNotFound(_))));
    }
}
