//! Accept loop: one thread per relay connection.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::error::Result;
use crate::infrastructure::{IdentityProvider, Registry};
use crate::tcp::tls::{TlsError, load_tls_acceptor};

use super::client_handler::ClientHandler;

/// Decrements the live-connection count when a connection thread ends.
struct ConnectionSlot(Arc<AtomicUsize>);

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct TcpServer {
    registry: Registry,
    identity: Arc<dyn IdentityProvider>,
    logger: logging::Logger,
    tls_acceptor: Option<Arc<native_tls::TlsAcceptor>>,
    max_connections: usize,
    poll_interval: Duration,
    active: Arc<AtomicUsize>,
}

impl TcpServer {
    pub fn new(registry: Registry, identity: Arc<dyn IdentityProvider>, logger: logging::Logger) -> Self {
        TcpServer {
            registry,
            identity,
            logger,
            tls_acceptor: None,
            max_connections: usize::MAX,
            poll_interval: Duration::from_millis(100),
            active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Enables TLS with the given PKCS#12 file and password.
    pub fn with_tls(mut self, pkcs12_path: &str, password: &str) -> std::result::Result<Self, TlsError> {
        let acceptor = load_tls_acceptor(pkcs12_path, password)?;
        self.logger
            .info(&format!("TLS enabled with certificate: {}", pkcs12_path));
        self.tls_acceptor = Some(acceptor);
        Ok(self)
    }

    pub fn with_max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Binds `bind_addr` and serves forever.
    pub fn start(&self, bind_addr: &str) -> Result<()> {
        let listener = TcpListener::bind(bind_addr)?;
        self.serve(listener)
    }

    /// Serves an already-bound listener forever.
    pub fn serve(&self, listener: TcpListener) -> Result<()> {
        let local: Option<SocketAddr> = listener.local_addr().ok();
        let protocol = if self.tls_acceptor.is_some() {
            "TLS"
        } else {
            "plain TCP"
        };
        self.logger.info(&format!(
            "Relay listening on {} ({})",
            local.map(|a| a.to_string()).unwrap_or_default(),
            protocol
        ));

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    self.logger
                        .error(&format!("Failed to accept connection: {}", e));
                    continue;
                }
            };

            if self.active.fetch_add(1, Ordering::SeqCst) >= self.max_connections {
                self.active.fetch_sub(1, Ordering::SeqCst);
                self.logger.warn(&format!(
                    "Connection limit of {} reached, dropping {}",
                    self.max_connections,
                    stream
                        .peer_addr()
                        .map(|a| a.to_string())
                        .unwrap_or_else(|_| "unknown peer".into())
                ));
                continue;
            }
            let slot = ConnectionSlot(self.active.clone());

            let registry = self.registry.clone();
            let identity = self.identity.clone();
            let logger = self.logger.for_component("ClientHandler");
            let tls_acceptor = self.tls_acceptor.clone();
            let poll_interval = self.poll_interval;

            thread::spawn(move || {
                let _slot = slot;
                match ClientHandler::new(stream, registry, identity, logger.clone(), tls_acceptor, poll_interval) {
                    Ok(mut handler) => {
                        if let Err(e) = handler.handle() {
                            logger.error(&format!("Connection ended with error: {}", e));
                        }
                    }
                    Err(e) => {
                        logger.error(&format!("Failed to set up connection: {}", e));
                    }
                }
            });
        }

        Ok(())
    }
}
