mod client_config;
mod logging_config;
mod relay_endpoint;
mod session_config;
mod transfer_config;

pub use client_config::{ClientConfig, DEFAULT_CONFIG_FILE};
pub use logging_config::LoggingConfig;
pub use relay_endpoint::RelayEndpoint;
pub use session_config::SessionConfig;
pub use transfer_config::TransferConfig;
