//! # Config Loader
//!
//! Locates JSON configuration files and deserializes them into `serde`
//! types. Configuration structs are expected to use `#[serde(default)]` so a
//! partial file only overrides what it names.
//!
//! ```no_run
//! use config_loader::{find_config_file, load_json};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Default)]
//! #[serde(default)]
//! struct Settings {
//!     port: u16,
//! }
//!
//! let path = find_config_file("relay_config.json")?;
//! let settings: Settings = load_json(&path)?;
//! # Ok::<(), config_loader::ConfigError>(())
//! ```

pub mod error;

pub use error::{ConfigError, Result};

use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Reads a configuration file into a string without interpreting it.
pub fn load_config_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    fs::read_to_string(path).map_err(|e| ConfigError::ReadError(e.to_string()))
}

/// Reads and deserializes a JSON configuration file.
pub fn load_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T> {
    let path = path.as_ref();
    let content = load_config_file(path)?;
    parse_json(&content, &path.display().to_string())
}

/// Deserializes configuration passed inline, e.g. through an environment
/// variable. `source_name` only appears in error messages.
pub fn parse_json<T: DeserializeOwned>(content: &str, source_name: &str) -> Result<T> {
    serde_json::from_str(content).map_err(|e| ConfigError::Parse {
        source_name: source_name.to_string(),
        message: e.to_string(),
    })
}

/// Looks for `filename` in the usual places.
///
/// Search order:
/// 1. `CONFIG_PATH` environment variable (if it points at an existing file)
/// 2. `./config/{filename}`
/// 3. `./{filename}`
pub fn find_config_file(filename: &str) -> Result<PathBuf> {
    if let Ok(path) = env::var("CONFIG_PATH") {
        let path_buf = PathBuf::from(&path);
        if path_buf.exists() {
            return Ok(path_buf);
        }
    }

    let candidates = [
        PathBuf::from("./config").join(filename),
        PathBuf::from("./").join(filename),
    ];
    if let Some(found) = candidates.into_iter().find(|p| p.exists()) {
        return Ok(found);
    }

    Err(ConfigError::FileNotFound(format!(
        "'{}' (searched CONFIG_PATH, ./config/{}, ./{})",
        filename, filename, filename
    )))
}

/// `find_config_file` followed by `load_json`.
pub fn find_and_load<T: DeserializeOwned>(filename: &str) -> Result<T> {
    let path = find_config_file(filename)?;
    load_json(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(default)]
    struct Sample {
        port: u16,
        name: String,
    }

    impl Default for Sample {
        fn default() -> Self {
            Sample {
                port: 9000,
                name: "relay".to_string(),
            }
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = load_config_file("/path/that/does/not/exist.json");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_find_nonexistent_file() {
        let result = find_config_file("file_that_definitely_does_not_exist_12345.json");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_json_fills_missing_fields_with_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "port": 7443 }}"#).unwrap();

        let sample: Sample = load_json(file.path()).unwrap();
        assert_eq!(sample.port, 7443);
        assert_eq!(sample.name, "relay");
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = parse_json::<Sample>("{ not json", "CONFIG env").unwrap_err();
        match err {
            ConfigError::Parse { source_name, .. } => assert_eq!(source_name, "CONFIG env"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
