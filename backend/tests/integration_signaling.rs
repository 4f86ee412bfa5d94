//! Integration tests for the signaling relay
//!
//! Drives the message handler the way connection threads do, with an mpsc
//! queue standing in for each participant's socket:
//! - authentication and registration
//! - session request / accept / negotiation relay
//! - unavailable peers
//! - reconnect and stale disconnects

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use logging::LogLevel;
use peerlink_relay::application::usecases::AuthOutcome;
use peerlink_relay::domain::ConnectionId;
use peerlink_relay::{MessageHandler, Registry, StaticTokenProvider};
use signaling_protocol::{
    AuthenticateMsg, CandidateInit, IceMsg, Message, OpaquePayload, PeerMsg, SdpMsg,
};

struct Peer {
    id: String,
    connection_id: ConnectionId,
    inbox: Receiver<Message>,
}

fn handler_with(registry: &Registry, logger: logging::Logger) -> MessageHandler {
    let identity = StaticTokenProvider::default()
        .with_token("tok-alice", "alice")
        .with_token("tok-bob", "bob")
        .with_token("tok-carol", "carol");
    MessageHandler::new(registry.clone(), Arc::new(identity), logger)
}

fn connect(handler: &MessageHandler, token: &str) -> Peer {
    match handler.auth().handle_authenticate(&AuthenticateMsg {
        token: token.to_string(),
    }) {
        AuthOutcome::Accepted {
            participant_id,
            connection_id,
            receiver,
            ..
        } => Peer {
            id: participant_id,
            connection_id,
            inbox: receiver,
        },
        AuthOutcome::Rejected(msg) => panic!("authentication failed: {:?}", msg),
    }
}

fn send(handler: &MessageHandler, from: &Peer, msg: Message) -> Option<Message> {
    handler.process_message(msg, Some(&from.id))
}

#[test]
fn test_session_handshake_is_relayed_between_the_right_pair() {
    let registry = Registry::new();
    let handler = handler_with(&registry, logging::Logger::disabled());
    let alice = connect(&handler, "tok-alice");
    let bob = connect(&handler, "tok-bob");
    let carol = connect(&handler, "tok-carol");

    assert_eq!(send(&handler, &alice, Message::RequestSession(PeerMsg::new("bob"))), None);
    assert_eq!(
        bob.inbox.try_recv().unwrap(),
        Message::SessionRequested(PeerMsg::new("alice"))
    );

    assert_eq!(send(&handler, &bob, Message::AcceptSession(PeerMsg::new("alice"))), None);
    assert_eq!(
        alice.inbox.try_recv().unwrap(),
        Message::SessionAccepted(PeerMsg::new("bob"))
    );

    send(
        &handler,
        &alice,
        Message::Offer(SdpMsg {
            peer_id: "bob".into(),
            sdp: OpaquePayload::new("offer-sdp"),
        }),
    );
    send(
        &handler,
        &bob,
        Message::Answer(SdpMsg {
            peer_id: "alice".into(),
            sdp: OpaquePayload::new("answer-sdp"),
        }),
    );
    send(
        &handler,
        &bob,
        Message::IceCandidate(IceMsg {
            peer_id: "alice".into(),
            candidate: CandidateInit::new("cand-1"),
        }),
    );

    match bob.inbox.try_recv().unwrap() {
        Message::OfferReceived(msg) => {
            assert_eq!(msg.peer_id, "alice");
            assert_eq!(msg.sdp.expose(), "offer-sdp");
        }
        other => panic!("unexpected: {:?}", other),
    }
    assert!(matches!(alice.inbox.try_recv().unwrap(), Message::AnswerReceived(m) if m.peer_id == "bob"));
    assert!(matches!(alice.inbox.try_recv().unwrap(), Message::IceCandidateReceived(m) if m.candidate.candidate.expose() == "cand-1"));

    // Nobody else saw any of it.
    assert!(carol.inbox.try_recv().is_err());
}

#[test]
fn test_request_to_offline_peer_yields_unavailable_and_forwards_nothing() {
    let registry = Registry::new();
    let handler = handler_with(&registry, logging::Logger::disabled());
    let alice = connect(&handler, "tok-alice");
    let carol = connect(&handler, "tok-carol");

    let reply = send(&handler, &alice, Message::RequestSession(PeerMsg::new("bob")));
    assert_eq!(reply, Some(Message::PeerUnavailable(PeerMsg::new("bob"))));
    assert!(carol.inbox.try_recv().is_err());
    assert!(alice.inbox.try_recv().is_err());
}

#[test]
fn test_disconnect_is_broadcast_to_everyone_else() {
    let registry = Registry::new();
    let handler = handler_with(&registry, logging::Logger::disabled());
    let alice = connect(&handler, "tok-alice");
    let bob = connect(&handler, "tok-bob");
    let carol = connect(&handler, "tok-carol");

    handler.cleanup_disconnect(&bob.id, bob.connection_id);

    for peer in [&alice, &carol] {
        assert_eq!(
            peer.inbox.try_recv().unwrap(),
            Message::PeerDisconnected(PeerMsg::new("bob"))
        );
    }
    assert!(!registry.is_registered(&"bob".to_string()));
}

#[test]
fn test_stale_disconnect_after_reconnect_is_ignored() {
    let registry = Registry::new();
    let handler = handler_with(&registry, logging::Logger::disabled());
    let alice = connect(&handler, "tok-alice");
    let old_bob = connect(&handler, "tok-bob");
    let new_bob = connect(&handler, "tok-bob");
    assert_ne!(old_bob.connection_id, new_bob.connection_id);

    // The old transport finally notices it is dead.
    handler.cleanup_disconnect(&old_bob.id, old_bob.connection_id);

    assert!(registry.is_registered(&"bob".to_string()));
    assert!(alice.inbox.try_recv().is_err(), "no PeerDisconnected for a live participant");

    send(&handler, &alice, Message::RequestSession(PeerMsg::new("bob")));
    assert!(new_bob.inbox.try_recv().is_ok());
}

#[test]
fn test_relay_log_never_contains_negotiation_payloads() {
    let registry = Registry::new();
    let (logger, buffer) = logging::Logger::in_memory(LogLevel::Debug);
    let handler = handler_with(&registry, logger);
    let alice = connect(&handler, "tok-alice");
    let _bob = connect(&handler, "tok-bob");

    let secret_sdp = "v=0\r\na=ice-pwd:TOPSECRETPWD\r\n";
    send(
        &handler,
        &alice,
        Message::Offer(SdpMsg {
            peer_id: "bob".into(),
            sdp: OpaquePayload::new(secret_sdp),
        }),
    );
    send(
        &handler,
        &alice,
        Message::IceCandidate(IceMsg {
            peer_id: "bob".into(),
            candidate: CandidateInit::new("candidate:TOPSECRETHOST"),
        }),
    );

    assert!(buffer.contains("SDP offer relayed: alice -> bob"));
    assert!(buffer.contains("ICE candidate relayed: alice -> bob"));
    assert!(!buffer.contains("TOPSECRET"));
}
