use signaling_protocol::ProtocolError;
use std::io;
use thiserror::Error;

use crate::tcp::tls::TlsError;

pub type Result<T> = std::result::Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("participant {0} is not connected")]
    PeerNotConnected(String),

    #[error("connection queue for {0} is closed")]
    QueueClosed(String),

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("TLS error: {0}")]
    Tls(#[from] TlsError),
}
