//! Integration tests for voice room membership and fan-out.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver};

use peerlink_relay::{MessageHandler, Registry, StaticTokenProvider};
use signaling_protocol::{Message, OpaquePayload, RoomMemberMsg, RoomMsg, RoomRosterMsg, RoomSdpMsg};

fn setup(ids: &[&str]) -> (Registry, MessageHandler, Vec<Receiver<Message>>) {
    let registry = Registry::new();
    let handler = MessageHandler::new(
        registry.clone(),
        Arc::new(StaticTokenProvider::default()),
        logging::Logger::disabled(),
    );
    let inboxes = ids
        .iter()
        .map(|id| {
            let (tx, rx) = mpsc::channel();
            registry.register(&id.to_string(), tx).unwrap();
            rx
        })
        .collect();
    (registry, handler, inboxes)
}

fn join(handler: &MessageHandler, who: &str, channel: &str) -> Vec<String> {
    match handler.process_message(
        Message::JoinRoom(RoomMsg {
            channel_id: channel.into(),
        }),
        Some(&who.to_string()),
    ) {
        Some(Message::RoomRoster(RoomRosterMsg { participants, .. })) => participants,
        other => panic!("expected roster, got {:?}", other),
    }
}

#[test]
fn test_roster_grows_with_each_joiner() {
    let (_registry, handler, inboxes) = setup(&["a", "b", "c"]);

    assert!(join(&handler, "a", "lobby").is_empty());
    assert_eq!(join(&handler, "b", "lobby"), vec!["a"]);
    assert_eq!(join(&handler, "c", "lobby"), vec!["a", "b"]);

    // a heard about b then c; b heard about c; c heard nothing.
    let joined = |rx: &Receiver<Message>| -> Vec<String> {
        rx.try_iter()
            .filter_map(|m| match m {
                Message::RoomUserJoined(RoomMemberMsg { participant_id, .. }) => Some(participant_id),
                _ => None,
            })
            .collect()
    };
    assert_eq!(joined(&inboxes[0]), vec!["b", "c"]);
    assert_eq!(joined(&inboxes[1]), vec!["c"]);
    assert!(joined(&inboxes[2]).is_empty());
}

#[test]
fn test_leave_notifies_remaining_and_empty_room_is_removed() {
    let (registry, handler, inboxes) = setup(&["a", "b"]);
    join(&handler, "a", "lobby");
    join(&handler, "b", "lobby");
    inboxes[0].try_iter().count();

    handler.process_message(
        Message::LeaveRoom(RoomMsg {
            channel_id: "lobby".into(),
        }),
        Some(&"b".to_string()),
    );
    assert_eq!(
        inboxes[0].try_recv().unwrap(),
        Message::RoomUserLeft(RoomMemberMsg {
            channel_id: "lobby".into(),
            participant_id: "b".into(),
        })
    );
    assert_eq!(registry.room_members(&"lobby".to_string()), Some(vec!["a".to_string()]));

    handler.process_message(
        Message::LeaveRoom(RoomMsg {
            channel_id: "lobby".into(),
        }),
        Some(&"a".to_string()),
    );
    assert_eq!(registry.room_count(), 0);
}

#[test]
fn test_disconnect_leaves_every_room() {
    let (registry, handler, inboxes) = setup(&["a", "b"]);
    join(&handler, "a", "one");
    join(&handler, "a", "two");
    join(&handler, "b", "two");

    let conn = registry.connection_of(&"a".to_string()).unwrap();
    handler.cleanup_disconnect(&"a".to_string(), conn);

    let received: Vec<Message> = inboxes[1].try_iter().collect();
    assert!(received.contains(&Message::RoomUserLeft(RoomMemberMsg {
        channel_id: "two".into(),
        participant_id: "a".into(),
    })));
    assert!(received.contains(&Message::PeerDisconnected(signaling_protocol::PeerMsg::new("a"))));
    assert_eq!(registry.room_count(), 1);
    assert_eq!(registry.room_members(&"two".to_string()), Some(vec!["b".to_string()]));
}

#[test]
fn test_voice_negotiation_is_scoped_by_channel() {
    let (_registry, handler, inboxes) = setup(&["a", "b"]);
    handler.process_message(
        Message::VoiceOffer(RoomSdpMsg {
            channel_id: "lobby".into(),
            peer_id: "b".into(),
            sdp: OpaquePayload::new("v=0"),
        }),
        Some(&"a".to_string()),
    );

    match inboxes[1].try_recv().unwrap() {
        Message::VoiceOfferReceived(msg) => {
            assert_eq!(msg.channel_id, "lobby");
            assert_eq!(msg.peer_id, "a");
        }
        other => panic!("unexpected: {:?}", other),
    }
}
