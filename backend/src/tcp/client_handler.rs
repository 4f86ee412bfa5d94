//! One relay connection: authentication, inbound dispatch, outbound queue.

use std::io;
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Duration;

use signaling_protocol::{ErrorMsg, Message, ProtocolError};

use crate::application::handlers::MessageHandler;
use crate::application::usecases::AuthOutcome;
use crate::domain::{ConnectionId, ParticipantId};
use crate::error::{RelayError, Result};
use crate::infrastructure::{IdentityProvider, Registry};
use crate::tcp::stream_type::StreamType;
use crate::tcp::tls::accept_tls;

struct Authenticated {
    participant_id: ParticipantId,
    connection_id: ConnectionId,
    outbound: Receiver<Message>,
}

enum Outbound {
    Open,
    /// The registry dropped our queue: the participant reconnected elsewhere.
    Replaced,
}

pub struct ClientHandler {
    stream: StreamType,
    peer_addr: SocketAddr,
    message_handler: MessageHandler,
    logger: logging::Logger,
    session: Option<Authenticated>,
}

impl ClientHandler {
    pub fn new(
        stream: TcpStream,
        registry: Registry,
        identity: Arc<dyn IdentityProvider>,
        logger: logging::Logger,
        tls_acceptor: Option<Arc<native_tls::TlsAcceptor>>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let peer_addr = stream.peer_addr()?;

        let stream = match tls_acceptor {
            Some(acceptor) => match accept_tls(stream, &acceptor) {
                Ok(tls_stream) => {
                    logger.debug(&format!("TLS handshake completed with {}", peer_addr));
                    StreamType::Tls(tls_stream)
                }
                Err(e) => {
                    logger.warn(&format!("TLS handshake failed with {}: {}", peer_addr, e));
                    return Err(e.into());
                }
            },
            None => StreamType::Plain(stream),
        };

        if let Err(e) = stream.set_read_timeout(poll_interval) {
            logger.warn(&format!("Failed to set read timeout: {}", e));
        }

        let message_handler = MessageHandler::new(registry, identity, logger.clone());

        Ok(ClientHandler {
            stream,
            peer_addr,
            message_handler,
            logger,
            session: None,
        })
    }

    /// Runs until the client disconnects or is replaced by a reconnect.
    pub fn handle(&mut self) -> Result<()> {
        self.logger
            .info(&format!("New connection from {}", self.peer_addr));

        let result = self.run();
        self.cleanup_disconnect();
        self.stream.shutdown();
        result
    }

    fn run(&mut self) -> Result<()> {
        loop {
            if let Outbound::Replaced = self.flush_outbound()? {
                self.logger.info(&format!(
                    "Closing {}: participant reconnected elsewhere",
                    self.peer_addr
                ));
                return Ok(());
            }

            let message = match self.stream.read_message() {
                Ok(msg) => msg,
                Err(e) if e.is_timeout() => continue,
                Err(ProtocolError::Io(e)) if is_hangup(&e) => {
                    self.logger
                        .info(&format!("{} closed the connection", self.peer_addr));
                    return Ok(());
                }
                Err(e) => {
                    self.logger
                        .error(&format!("Failed to read from {}: {}", self.peer_addr, e));
                    return Err(e.into());
                }
            };

            if !self.dispatch(message)? {
                return Ok(());
            }
        }
    }

    /// Handles one inbound message. Returns false when the connection should
    /// be closed.
    fn dispatch(&mut self, message: Message) -> Result<bool> {
        if let Message::Authenticate(req) = &message
            && self.session.is_none()
        {
            return match self.message_handler.auth().handle_authenticate(req) {
                AuthOutcome::Accepted {
                    participant_id,
                    connection_id,
                    receiver,
                    response,
                } => {
                    self.session = Some(Authenticated {
                        participant_id,
                        connection_id,
                        outbound: receiver,
                    });
                    self.send(&response)?;
                    Ok(true)
                }
                AuthOutcome::Rejected(response) => {
                    self.send(&response)?;
                    Ok(false)
                }
            };
        }

        let authenticated = self.session.as_ref().map(|s| &s.participant_id);
        if let Some(response) = self.message_handler.process_message(message, authenticated) {
            if let Message::Error(ErrorMsg { code, message }) = &response {
                self.logger
                    .warn(&format!("Error {} to {}: {}", code, self.peer_addr, message));
            }
            self.send(&response)?;
        }
        Ok(true)
    }

    /// Writes everything queued for this participant by other connections.
    fn flush_outbound(&mut self) -> Result<Outbound> {
        let Some(session) = &self.session else {
            return Ok(Outbound::Open);
        };

        let mut pending = Vec::new();
        let state = loop {
            match session.outbound.try_recv() {
                Ok(msg) => pending.push(msg),
                Err(TryRecvError::Empty) => break Outbound::Open,
                Err(TryRecvError::Disconnected) => break Outbound::Replaced,
            }
        };

        for msg in &pending {
            self.send(msg)?;
        }
        Ok(state)
    }

    fn send(&mut self, msg: &Message) -> Result<()> {
        self.stream.write_message(msg).map_err(|e| {
            self.logger.error(&format!(
                "Failed to send {} to {}: {}",
                msg.label(),
                self.peer_addr,
                e
            ));
            RelayError::from(e)
        })
    }

    fn cleanup_disconnect(&mut self) {
        if let Some(session) = self.session.take() {
            self.message_handler
                .cleanup_disconnect(&session.participant_id, session.connection_id);
        }
    }
}

fn is_hangup(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
