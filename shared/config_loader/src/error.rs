use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    #[error("failed to read configuration file: {0}")]
    ReadError(String),

    /// The file was read but its JSON does not match the expected shape.
    #[error("invalid configuration in {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },
}
