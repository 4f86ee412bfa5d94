use signaling_protocol::ProtocolError;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failures reported by the platform peer-connection stack.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PeerError {
    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("ICE candidate rejected: {0}")]
    Candidate(String),

    #[error("data channel error: {0}")]
    Channel(String),

    #[error("unexpected {0} for the current negotiation role")]
    UnexpectedDescription(&'static str),

    #[error("peer connection closed")]
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MediaError {
    #[error("capture device unavailable: {0}")]
    Unavailable(String),

    #[error("permission denied for {0}")]
    PermissionDenied(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransferError {
    #[error("data channel closed after {sent} of {total} chunks")]
    ChannelClosed { sent: usize, total: usize },

    #[error("malformed data channel message: {0}")]
    Malformed(String),

    #[error("chunk {index} of transfer {id} is not valid base64")]
    InvalidChunk { id: String, index: usize },

    #[error(transparent)]
    Peer(#[from] PeerError),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no session with {0}")]
    UnknownPeer(String),

    #[error("session with {peer} is {status}, cannot {action}")]
    InvalidState {
        peer: String,
        status: String,
        action: &'static str,
    },

    #[error("data channel to {0} is not open")]
    ChannelNotOpen(String),

    #[error("cannot open a session with yourself")]
    SelfTarget,

    #[error("relay connection closed")]
    RelayClosed,

    #[error("relay rejected authentication: {0}")]
    AuthenticationRejected(String),

    #[error("{0} lock poisoned")]
    LockPoisoned(&'static str),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Transfer(#[from] TransferError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("configuration error: {0}")]
    Config(#[from] config_loader::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
