//! Client end of the relay link.
//!
//! One I/O thread owns the socket: it alternates between flushing the
//! outbound queue and reading with a short timeout, the same loop the relay
//! runs per connection. Inbound frames go to the logic thread's queue.

use std::io;
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use signaling_protocol::{
    AuthenticateMsg, Message, ParticipantId, ProtocolError, read_message, write_message,
};

use crate::config::RelayEndpoint;
use crate::error::{ClientError, Result};
use crate::inbound::Inbound;
use crate::transport::SignalingSink;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

enum RelayStream {
    Plain(TcpStream),
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}

impl RelayStream {
    fn tcp(&self) -> &TcpStream {
        match self {
            RelayStream::Plain(stream) => stream,
            RelayStream::Tls(stream) => stream.get_ref(),
        }
    }

    fn set_read_timeout(&self, timeout: Duration) -> io::Result<()> {
        self.tcp().set_read_timeout(Some(timeout))
    }

    fn read_message(&mut self) -> std::result::Result<Message, ProtocolError> {
        match self {
            RelayStream::Plain(stream) => read_message(stream),
            RelayStream::Tls(stream) => read_message(stream.as_mut()),
        }
    }

    fn write_message(&mut self, message: &Message) -> std::result::Result<(), ProtocolError> {
        match self {
            RelayStream::Plain(stream) => write_message(stream, message),
            RelayStream::Tls(stream) => write_message(stream.as_mut(), message),
        }
    }

    fn shutdown(&mut self) {
        let _ = match self {
            RelayStream::Plain(stream) => stream.shutdown(Shutdown::Both),
            RelayStream::Tls(stream) => stream.shutdown(),
        };
    }
}

pub struct RelayConnection {
    participant_id: ParticipantId,
    outbound: Mutex<Option<Sender<Message>>>,
    stop: Arc<AtomicBool>,
    io_thread: Mutex<Option<JoinHandle<()>>>,
    logger: logging::Logger,
}

impl RelayConnection {
    /// Connects, authenticates with the endpoint's token and starts the I/O
    /// thread.
    pub fn connect(
        endpoint: &RelayEndpoint,
        inbound: Sender<Inbound>,
        logger: logging::Logger,
    ) -> Result<Arc<Self>> {
        let addr = endpoint.addr();
        logger.info(&format!("Connecting to relay at {}", addr));

        let socket_addr = addr.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("cannot resolve {}", addr))
        })?;
        let timeout = Duration::from_secs(endpoint.connect_timeout_secs.max(1));
        let tcp = TcpStream::connect_timeout(&socket_addr, timeout)?;

        let mut stream = if endpoint.enable_tls {
            RelayStream::Tls(Box::new(connect_tls(endpoint, tcp)?))
        } else {
            RelayStream::Plain(tcp)
        };

        stream.set_read_timeout(timeout)?;
        let participant_id = authenticate(&mut stream, &endpoint.auth_token)?;
        logger.info(&format!("Authenticated as {}", participant_id));
        stream.set_read_timeout(POLL_INTERVAL)?;

        let (outbound_tx, outbound_rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let io_thread = {
            let stop = Arc::clone(&stop);
            let logger = logger.clone();
            thread::Builder::new()
                .name("relay-io".to_string())
                .spawn(move || run_io(stream, outbound_rx, inbound, stop, logger))?
        };

        Ok(Arc::new(RelayConnection {
            participant_id,
            outbound: Mutex::new(Some(outbound_tx)),
            stop,
            io_thread: Mutex::new(Some(io_thread)),
            logger,
        }))
    }

    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Stops the I/O thread after it flushes what is already queued.
    pub fn close(&self) {
        if let Ok(mut outbound) = self.outbound.lock() {
            outbound.take();
        }
        self.stop.store(true, Ordering::Release);

        let handle = self.io_thread.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle
            && handle.join().is_err()
        {
            self.logger.error("Relay I/O thread panicked");
        }
    }
}

impl SignalingSink for RelayConnection {
    fn send(&self, message: Message) -> Result<()> {
        let outbound = self
            .outbound
            .lock()
            .map_err(|_| ClientError::LockPoisoned("relay outbound"))?;
        match outbound.as_ref() {
            Some(sender) => sender.send(message).map_err(|_| ClientError::RelayClosed),
            None => Err(ClientError::RelayClosed),
        }
    }
}

impl Drop for RelayConnection {
    fn drop(&mut self) {
        self.close();
    }
}

fn connect_tls(
    endpoint: &RelayEndpoint,
    tcp: TcpStream,
) -> Result<native_tls::TlsStream<TcpStream>> {
    let connector = native_tls::TlsConnector::builder()
        .danger_accept_invalid_certs(endpoint.accept_invalid_certs)
        .danger_accept_invalid_hostnames(endpoint.accept_invalid_certs)
        .build()
        .map_err(|e| io::Error::other(format!("TLS connector error: {}", e)))?;

    let stream = connector
        .connect(&endpoint.address, tcp)
        .map_err(|e| io::Error::other(format!("TLS handshake failed: {}", e)))?;
    Ok(stream)
}

fn authenticate(stream: &mut RelayStream, token: &str) -> Result<ParticipantId> {
    stream.write_message(&Message::Authenticate(AuthenticateMsg {
        token: token.to_string(),
    }))?;

    match stream.read_message()? {
        Message::Authenticated(m) => Ok(m.participant_id),
        Message::Error(e) => Err(ClientError::AuthenticationRejected(e.message)),
        other => Err(ClientError::AuthenticationRejected(format!(
            "unexpected {} during handshake",
            other.label()
        ))),
    }
}

fn run_io(
    mut stream: RelayStream,
    outbound: Receiver<Message>,
    inbound: Sender<Inbound>,
    stop: Arc<AtomicBool>,
    logger: logging::Logger,
) {
    loop {
        if !flush_outbound(&mut stream, &outbound, &logger) || stop.load(Ordering::Acquire) {
            break;
        }

        match stream.read_message() {
            Ok(message) => {
                logger.debug(&format!("Received {}", message.label()));
                if inbound.send(Inbound::Relay(message)).is_err() {
                    break;
                }
            }
            Err(e) if e.is_timeout() => continue,
            Err(e) => {
                logger.warn(&format!("Relay connection lost: {}", e));
                let _ = inbound.send(Inbound::RelayClosed);
                break;
            }
        }
    }

    stream.shutdown();
    logger.info("Relay connection closed");
}

/// Writes everything queued. False once the link is unusable or the queue
/// was closed and drained.
fn flush_outbound(
    stream: &mut RelayStream,
    outbound: &Receiver<Message>,
    logger: &logging::Logger,
) -> bool {
    loop {
        match outbound.try_recv() {
            Ok(message) => {
                if let Err(e) = stream.write_message(&message) {
                    logger.warn(&format!("Failed to send {}: {}", message.label(), e));
                    return false;
                }
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}
