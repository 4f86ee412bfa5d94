//! Message handler - routes authenticated client verbs to the use cases

use std::sync::Arc;

use signaling_protocol::{ErrorMsg, Message};

use crate::application::usecases::{AuthUseCase, RoomUseCase, SignalingUseCase};
use crate::domain::{ConnectionId, ParticipantId, RelayVerb, Scope};
use crate::infrastructure::{IdentityProvider, Registry};

pub struct MessageHandler {
    auth_usecase: AuthUseCase,
    signaling_usecase: SignalingUseCase,
    room_usecase: RoomUseCase,
}

impl MessageHandler {
    pub fn new(
        registry: Registry,
        identity: Arc<dyn IdentityProvider>,
        logger: logging::Logger,
    ) -> Self {
        let signaling_usecase =
            SignalingUseCase::new(registry.clone(), logger.for_component("Signaling Usecase"));
        MessageHandler {
            auth_usecase: AuthUseCase::new(
                identity,
                signaling_usecase.clone(),
                logger.for_component("Auth Usecase"),
            ),
            room_usecase: RoomUseCase::new(registry, logger.for_component("Room Usecase")),
            signaling_usecase,
        }
    }

    pub fn auth(&self) -> &AuthUseCase {
        &self.auth_usecase
    }

    /// Handles one verb from a client. The returned message, if any, goes
    /// back to that same client.
    pub fn process_message(
        &self,
        message: Message,
        authenticated: Option<&ParticipantId>,
    ) -> Option<Message> {
        match message {
            Message::Heartbeat => None,

            // Authentication is owned by the connection, which has to keep
            // the outbound queue it yields.
            Message::Authenticate(_) => Some(Message::Error(ErrorMsg {
                code: 409,
                message: "Already authenticated".to_string(),
            })),

            Message::RequestSession(req) => self.require_auth(authenticated, |source| {
                if *source == req.peer_id {
                    return Some(Message::Error(ErrorMsg::bad_request(
                        "Cannot open a session with yourself",
                    )));
                }
                self.signaling_usecase
                    .relay(source, &req.peer_id, RelayVerb::RequestSession)
            }),
            Message::AcceptSession(req) => self.require_auth(authenticated, |source| {
                self.signaling_usecase
                    .relay(source, &req.peer_id, RelayVerb::AcceptSession)
            }),
            Message::RejectSession(req) => self.require_auth(authenticated, |source| {
                self.signaling_usecase
                    .relay(source, &req.peer_id, RelayVerb::RejectSession)
            }),
            Message::EndSession(req) => self.require_auth(authenticated, |source| {
                self.signaling_usecase
                    .relay(source, &req.peer_id, RelayVerb::EndSession)
            }),
            Message::Offer(msg) => self.require_auth(authenticated, |source| {
                self.signaling_usecase
                    .relay(source, &msg.peer_id, RelayVerb::Offer(Scope::Direct, msg.sdp))
            }),
            Message::Answer(msg) => self.require_auth(authenticated, |source| {
                self.signaling_usecase
                    .relay(source, &msg.peer_id, RelayVerb::Answer(Scope::Direct, msg.sdp))
            }),
            Message::IceCandidate(msg) => self.require_auth(authenticated, |source| {
                self.signaling_usecase.relay(
                    source,
                    &msg.peer_id,
                    RelayVerb::IceCandidate(Scope::Direct, msg.candidate),
                )
            }),
            Message::IsOnline(req) => self.require_auth(authenticated, |_| {
                Some(self.signaling_usecase.is_online(&req.peer_id))
            }),

            Message::JoinRoom(req) => self.require_auth(authenticated, |participant| {
                self.room_usecase.join_room(participant, &req.channel_id)
            }),
            Message::LeaveRoom(req) => self.require_auth(authenticated, |participant| {
                self.room_usecase.leave_room(participant, &req.channel_id)
            }),
            Message::VoiceOffer(msg) => self.require_auth(authenticated, |source| {
                self.signaling_usecase.relay(
                    source,
                    &msg.peer_id,
                    RelayVerb::Offer(Scope::Room(msg.channel_id), msg.sdp),
                )
            }),
            Message::VoiceAnswer(msg) => self.require_auth(authenticated, |source| {
                self.signaling_usecase.relay(
                    source,
                    &msg.peer_id,
                    RelayVerb::Answer(Scope::Room(msg.channel_id), msg.sdp),
                )
            }),
            Message::VoiceIceCandidate(msg) => self.require_auth(authenticated, |source| {
                self.signaling_usecase.relay(
                    source,
                    &msg.peer_id,
                    RelayVerb::IceCandidate(Scope::Room(msg.channel_id), msg.candidate),
                )
            }),

            other => Some(Message::Error(ErrorMsg::bad_request(format!(
                "{} is not accepted from clients",
                other.label()
            )))),
        }
    }

    fn require_auth<F>(&self, authenticated: Option<&ParticipantId>, handler: F) -> Option<Message>
    where
        F: FnOnce(&ParticipantId) -> Option<Message>,
    {
        match authenticated {
            Some(participant) => handler(participant),
            None => Some(Message::Error(ErrorMsg::unauthorized())),
        }
    }

    /// Transport for `participant` dropped. Everything is skipped when the
    /// connection had already been replaced by a reconnect.
    pub fn cleanup_disconnect(&self, participant: &ParticipantId, connection_id: ConnectionId) {
        if !self.signaling_usecase.deregister(participant, connection_id) {
            return;
        }
        self.room_usecase.leave_all(participant);
        self.signaling_usecase.notify_disconnect(participant);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::StaticTokenProvider;
    use signaling_protocol::{PeerMsg, RoomMsg};

    fn handler() -> MessageHandler {
        MessageHandler::new(
            Registry::new(),
            Arc::new(StaticTokenProvider::default()),
            logging::Logger::disabled(),
        )
    }

    #[test]
    fn test_unauthenticated_verbs_are_refused() {
        let reply = handler().process_message(Message::JoinRoom(RoomMsg { channel_id: "x".into() }), None);
        assert!(matches!(reply, Some(Message::Error(ErrorMsg { code: 401, .. }))));
    }

    #[test]
    fn test_heartbeat_needs_no_auth() {
        assert_eq!(handler().process_message(Message::Heartbeat, None), None);
    }

    #[test]
    fn test_self_request_is_bad_request() {
        let me = "alice".to_string();
        let reply = handler().process_message(Message::RequestSession(PeerMsg::new("alice")), Some(&me));
        assert!(matches!(reply, Some(Message::Error(ErrorMsg { code: 400, .. }))));
    }

    #[test]
    fn test_relay_only_verbs_from_clients_are_rejected() {
        let me = "alice".to_string();
        let reply = handler().process_message(Message::SessionAccepted(PeerMsg::new("bob")), Some(&me));
        match reply {
            Some(Message::Error(err)) => {
                assert_eq!(err.code, 400);
                assert!(err.message.contains("SessionAccepted"));
            }
            other => panic!("unexpected reply: {:?}", other),
        }
    }
}
