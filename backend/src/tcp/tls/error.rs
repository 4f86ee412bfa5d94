use native_tls::HandshakeError;
use std::io;
use std::net::TcpStream;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("TLS error: {0}")]
    NativeTls(#[from] native_tls::Error),

    #[error("TLS handshake failed: {0}")]
    Handshake(String),
}

impl From<HandshakeError<TcpStream>> for TlsError {
    fn from(err: HandshakeError<TcpStream>) -> Self {
        TlsError::Handshake(err.to_string())
    }
}
