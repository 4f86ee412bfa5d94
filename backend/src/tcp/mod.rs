//! TCP transport for the relay, plain or TLS.

mod client_handler;
mod server;
mod stream_type;
pub mod tls;

pub use server::TcpServer;
