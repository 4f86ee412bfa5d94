//! Relay configuration

pub mod auth_config;
pub mod logging_config;
pub mod relay_config;
pub mod server_config;

pub use auth_config::AuthConfig;
pub use logging_config::LoggingConfig;
pub use relay_config::RelayConfig;
pub use server_config::ServerConfig;
