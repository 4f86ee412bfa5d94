//! PeerLink relay
//!
//! Forwards session-control and negotiation verbs between authenticated
//! participants and tracks voice room membership. Payloads pass through
//! unread; nothing outlives the process.

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod tcp;

pub use application::handlers::MessageHandler;
pub use error::{RelayError, Result};
pub use infrastructure::{IdentityProvider, Registry, StaticTokenProvider};
pub use tcp::TcpServer;
