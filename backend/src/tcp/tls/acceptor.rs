use native_tls::{Identity, TlsAcceptor, TlsStream};
use std::fs;
use std::net::TcpStream;
use std::sync::Arc;

use super::error::TlsError;

/// Builds a server-side acceptor from a PKCS#12 identity file.
pub fn load_tls_acceptor(pkcs12_path: &str, password: &str) -> Result<Arc<TlsAcceptor>, TlsError> {
    let identity_data = fs::read(pkcs12_path)
        .map_err(|e| TlsError::InvalidCertificate(format!("cannot open {}: {}", pkcs12_path, e)))?;

    if identity_data.is_empty() {
        return Err(TlsError::InvalidCertificate(format!(
            "{} is empty",
            pkcs12_path
        )));
    }

    let identity = Identity::from_pkcs12(&identity_data, password)
        .map_err(|e| TlsError::InvalidCertificate(format!("invalid PKCS#12 data: {}", e)))?;

    Ok(Arc::new(TlsAcceptor::new(identity)?))
}

/// Runs the server handshake on a freshly accepted socket.
pub fn accept_tls(
    stream: TcpStream,
    acceptor: &TlsAcceptor,
) -> Result<Box<TlsStream<TcpStream>>, TlsError> {
    Ok(Box::new(acceptor.accept(stream)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_missing_file() {
        let err = load_tls_acceptor("nonexistent.pfx", "password").err().unwrap();
        assert!(matches!(err, TlsError::InvalidCertificate(msg) if msg.contains("nonexistent.pfx")));
    }

    #[test]
    fn test_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().display().to_string();
        let err = load_tls_acceptor(&path, "").err().unwrap();
        assert!(matches!(err, TlsError::InvalidCertificate(msg) if msg.ends_with("is empty")));
    }

    #[test]
    fn test_garbage_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not pkcs12").unwrap();
        let path = file.path().display().to_string();
        assert!(load_tls_acceptor(&path, "pw").is_err());
    }
}
