use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid message type: 0x{0:02X}")]
    InvalidMessageType(u8),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("message too large: {0} bytes")]
    MessageTooLarge(u32),

    /// A length header of zero cannot even hold the type byte.
    #[error("empty frame")]
    EmptyFrame,
}

impl ProtocolError {
    /// True for read timeouts on a stream configured with a read timeout.
    /// Callers polling their own outbound queue treat this as "nothing yet".
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            ProtocolError::Io(e)
                if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut
        )
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
