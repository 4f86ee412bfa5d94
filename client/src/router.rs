//! The client's logic thread: one queue, one consumer.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Instant;

use signaling_protocol::Message;

use crate::config::SessionConfig;
use crate::inbound::Inbound;
use crate::mesh::VoiceMeshManager;
use crate::peer::SignalScope;
use crate::session::DirectSessionManager;
use crate::transport::SignalingSink;

pub struct EventRouter {
    sessions: Arc<DirectSessionManager>,
    mesh: Arc<VoiceMeshManager>,
    signaling: Arc<dyn SignalingSink>,
    logger: logging::Logger,
}

impl EventRouter {
    pub fn new(
        sessions: Arc<DirectSessionManager>,
        mesh: Arc<VoiceMeshManager>,
        signaling: Arc<dyn SignalingSink>,
        logger: logging::Logger,
    ) -> Self {
        EventRouter {
            sessions,
            mesh,
            signaling,
            logger,
        }
    }

    /// Hands one inbound item to the manager that owns it. False once the
    /// loop should stop.
    pub fn route(&self, inbound: Inbound) -> bool {
        match inbound {
            Inbound::Relay(message) => self.route_signal(message),
            Inbound::Peer {
                scope: SignalScope::Direct,
                peer_id,
                link_id,
                event,
            } => self.sessions.handle_peer_event(&peer_id, link_id, event),
            Inbound::Peer {
                scope: SignalScope::Room(_),
                peer_id,
                link_id,
                event,
            } => self.mesh.handle_peer_event(&peer_id, link_id, event),
            Inbound::RelayClosed => self
                .logger
                .warn("Relay connection lost; established peer links stay up"),
            Inbound::Shutdown => return false,
        }
        true
    }

    fn route_signal(&self, message: Message) {
        match message {
            Message::RoomRoster(_)
            | Message::RoomUserJoined(_)
            | Message::RoomUserLeft(_)
            | Message::VoiceOfferReceived(_)
            | Message::VoiceAnswerReceived(_)
            | Message::VoiceIceCandidateReceived(_) => self.mesh.handle_signal(message),
            Message::PeerDisconnected(_) => {
                self.mesh.handle_signal(message.clone());
                self.sessions.handle_signal(message);
            }
            Message::Error(e) => self
                .logger
                .warn(&format!("Relay error {}: {}", e.code, e.message)),
            Message::Authenticated(m) => self
                .logger
                .debug(&format!("Relay confirmed identity {}", m.participant_id)),
            Message::Heartbeat => {}
            other => self.sessions.handle_signal(other),
        }
    }

    /// Runs until [`Inbound::Shutdown`] arrives or every sender is gone.
    ///
    /// Between items it expires stalled negotiations, prunes abandoned
    /// transfers and keeps the relay link alive.
    pub fn run(&self, inbound: Receiver<Inbound>, config: &SessionConfig) {
        let tick = config.tick_interval();
        let heartbeat_every = config.heartbeat_interval();
        let mut last_heartbeat = Instant::now();
        self.logger.info("Event loop started");

        loop {
            match inbound.recv_timeout(tick) {
                Ok(item) => {
                    if !self.route(item) {
                        break;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }

            let now = Instant::now();
            for peer_id in self.sessions.expire_stale(now) {
                self.logger
                    .info(&format!("Gave up connecting to {}", peer_id));
            }
            self.sessions.prune_stale_transfers(now);

            if now.saturating_duration_since(last_heartbeat) >= heartbeat_every {
                if let Err(e) = self.signaling.send(Message::Heartbeat) {
                    self.logger.debug(&format!("Heartbeat not sent: {}", e));
                }
                last_heartbeat = now;
            }
        }

        self.logger.info("Event loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TransferConfig;
    use crate::context::ClientContext;
    use crate::session::SessionStatus;
    use crate::testing::{MockMedia, MockNetwork, RecordingSignaling};
    use crate::transport::{ExclusiveCapture, StaticDirectory};
    use signaling_protocol::PeerMsg;
    use std::sync::mpsc;
    use std::thread;

    fn router() -> (EventRouter, Arc<RecordingSignaling>, mpsc::Sender<Inbound>, Receiver<Inbound>) {
        let (inbound_tx, inbound_rx) = mpsc::channel();
        let signaling = Arc::new(RecordingSignaling::new());
        let network = MockNetwork::new();
        let ctx = ClientContext {
            local_id: "alice".to_string(),
            signaling: signaling.clone(),
            factory: network.factory("alice"),
            directory: Arc::new(StaticDirectory::new()),
            capture: Arc::new(ExclusiveCapture::new(
                Arc::new(MockMedia::new("alice")),
                logging::Logger::disabled(),
            )),
            inbound: inbound_tx.clone(),
            logger: logging::Logger::disabled(),
        };
        let (session_tx, _) = mpsc::channel();
        let (mesh_tx, _) = mpsc::channel();
        let sessions = Arc::new(DirectSessionManager::new(
            ctx.clone(),
            &SessionConfig::default(),
            &TransferConfig::default(),
            session_tx,
        ));
        let mesh = Arc::new(VoiceMeshManager::new(ctx, mesh_tx));
        let router = EventRouter::new(sessions, mesh, signaling.clone(), logging::Logger::disabled());
        (router, signaling, inbound_tx, inbound_rx)
    }

    #[test]
    fn test_session_verbs_reach_the_session_manager() {
        let (router, _signaling, _tx, _rx) = router();

        assert!(router.route(Inbound::Relay(Message::SessionRequested(PeerMsg::new("bob")))));

        assert_eq!(router.sessions.status("bob"), Some(SessionStatus::Incoming));
    }

    #[test]
    fn test_relay_loss_keeps_the_loop_running() {
        let (router, _signaling, _tx, _rx) = router();

        assert!(router.route(Inbound::RelayClosed));
        assert!(!router.route(Inbound::Shutdown));
    }

    #[test]
    fn test_run_stops_on_shutdown() {
        let (router, _signaling, tx, rx) = router();
        let config = SessionConfig {
            tick_interval_ms: 5,
            ..SessionConfig::default()
        };

        let handle = thread::spawn(move || router.run(rx, &config));
        tx.send(Inbound::Shutdown).unwrap();

        handle.join().unwrap();
    }

    #[test]
    fn test_run_sends_heartbeats() {
        let (router, signaling, tx, rx) = router();
        let config = SessionConfig {
            tick_interval_ms: 5,
            heartbeat_interval_secs: 1,
            ..SessionConfig::default()
        };

        let handle = thread::spawn(move || router.run(rx, &config));
        thread::sleep(std::time::Duration::from_millis(1200));
        tx.send(Inbound::Shutdown).unwrap();
        handle.join().unwrap();

        assert!(signaling.sent().contains(&Message::Heartbeat));
    }
}
