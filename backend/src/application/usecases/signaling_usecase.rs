//! Point-to-point relay between live participants.
//!
//! Session descriptions and ICE candidates pass through as opaque payloads.
//! Log lines name the verb and both parties and nothing else.

use std::sync::mpsc::Sender;

use signaling_protocol::{Message, OnlineStatusMsg, PeerMsg};

use crate::domain::{ConnectionId, ParticipantId, RelayVerb};
use crate::error::{RelayError, Result};
use crate::infrastructure::Registry;

#[derive(Clone)]
pub struct SignalingUseCase {
    registry: Registry,
    logger: logging::Logger,
}

impl SignalingUseCase {
    pub fn new(registry: Registry, logger: logging::Logger) -> Self {
        SignalingUseCase { registry, logger }
    }

    /// Binds `participant` to the connection whose queue is `sender`.
    pub fn register(&self, participant: &ParticipantId, sender: Sender<Message>) -> Result<ConnectionId> {
        let registered = self.registry.register(participant, sender)?;
        match registered.replaced {
            Some(old) => self.logger.info(&format!(
                "{} reconnected on {}, replacing {}",
                participant, registered.connection_id, old
            )),
            None => self.logger.info(&format!(
                "{} registered on {}",
                participant, registered.connection_id
            )),
        }
        Ok(registered.connection_id)
    }

    /// Drops the registration if `connection_id` is still the live one.
    /// Returns false for a connection that was already replaced.
    pub fn deregister(&self, participant: &ParticipantId, connection_id: ConnectionId) -> bool {
        match self.registry.deregister(participant, connection_id) {
            Ok(Some(connected_for)) => {
                self.logger.info(&format!(
                    "{} deregistered from {} after {}s",
                    participant,
                    connection_id,
                    connected_for.num_seconds()
                ));
                true
            }
            Ok(None) => {
                self.logger.debug(&format!(
                    "Ignoring disconnect of replaced {} for {}",
                    connection_id, participant
                ));
                false
            }
            Err(e) => {
                self.logger.error(&format!("Deregistration failed: {}", e));
                false
            }
        }
    }

    /// Forwards `verb` from `source` to `target`.
    ///
    /// Returns the message to send back to `source`, which is only ever a
    /// `PeerUnavailable` notice for a session request that could not be
    /// delivered.
    pub fn relay(&self, source: &ParticipantId, target: &ParticipantId, verb: RelayVerb) -> Option<Message> {
        let name = verb.name();
        let reports_unavailable = verb.reports_unavailable();
        let chatty = verb.is_chatty();

        match self.registry.forward(target, verb.deliver_from(source)) {
            Ok(()) => {
                let line = format!("{} relayed: {} -> {}", name, source, target);
                if chatty {
                    self.logger.debug(&line);
                } else {
                    self.logger.info(&line);
                }
                None
            }
            Err(RelayError::PeerNotConnected(_) | RelayError::QueueClosed(_)) => {
                if reports_unavailable {
                    self.logger
                        .info(&format!("{} from {}: {} is offline", name, source, target));
                    Some(Message::PeerUnavailable(PeerMsg::new(target.clone())))
                } else {
                    self.logger.debug(&format!(
                        "{} from {} not delivered, {} is offline",
                        name, source, target
                    ));
                    None
                }
            }
            Err(e) => {
                self.logger
                    .error(&format!("{} from {} to {} failed: {}", name, source, target, e));
                reports_unavailable.then(|| Message::PeerUnavailable(PeerMsg::new(target.clone())))
            }
        }
    }

    /// Tells every other live participant that `participant` dropped.
    pub fn notify_disconnect(&self, participant: &ParticipantId) -> usize {
        let notified = self.registry.broadcast_except(
            participant,
            &Message::PeerDisconnected(PeerMsg::new(participant.clone())),
        );
        self.logger.info(&format!(
            "Disconnect of {} announced to {} participant(s)",
            participant, notified
        ));
        notified
    }

    pub fn is_online(&self, participant: &ParticipantId) -> Message {
        Message::OnlineStatus(OnlineStatusMsg {
            peer_id: participant.clone(),
            online: self.registry.is_registered(participant),
        })
    }
}
