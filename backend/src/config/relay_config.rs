use serde::Deserialize;

use crate::config::{AuthConfig, LoggingConfig, ServerConfig};

pub const DEFAULT_CONFIG_FILE: &str = "relay_config.json";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub auth: AuthConfig,
}

impl RelayConfig {
    pub fn load_from_file(path: &str) -> config_loader::Result<Self> {
        config_loader::load_json(path)
    }

    /// Resolves configuration in this order:
    /// 1. `CONFIG` environment variable holding the JSON itself
    /// 2. the path given as first command-line argument
    /// 3. `relay_config.json` in the usual config locations
    ///
    /// Falls back to defaults when nothing loads; the returned notes say what
    /// happened, since the logger does not exist yet at this point.
    pub fn resolve(env_json: Option<String>, cli_path: Option<String>) -> (Self, Vec<String>) {
        let mut notes = Vec::new();

        if let Some(json) = env_json {
            match config_loader::parse_json::<RelayConfig>(&json, "CONFIG env") {
                Ok(cfg) => {
                    notes.push("configuration loaded from CONFIG env".to_string());
                    return (cfg, notes);
                }
                Err(e) => notes.push(format!("ignoring CONFIG env: {}", e)),
            }
        }

        let loaded = match cli_path {
            Some(path) => Self::load_from_file(&path).map(|cfg| (cfg, path)),
            None => config_loader::find_config_file(DEFAULT_CONFIG_FILE).and_then(|path| {
                let shown = path.display().to_string();
                config_loader::load_json::<RelayConfig, _>(path).map(|cfg| (cfg, shown))
            }),
        };

        match loaded {
            Ok((cfg, path)) => {
                notes.push(format!("configuration loaded from {}", path));
                (cfg, notes)
            }
            Err(e) => {
                notes.push(format!("{}; using default values", e));
                (RelayConfig::default(), notes)
            }
        }
    }
}
