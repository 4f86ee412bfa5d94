//! File transfer over an established session, and sender flow control.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use peerlink_client::session::{LogEntry, SessionEvent};
use peerlink_client::testing::{MockDataChannel, MockNetwork, MockRelay, TestParticipant};
use peerlink_client::transfer::{CHUNK_SIZE, FileSender, MAX_BUFFERED_AMOUNT, WireMessage};
use peerlink_client::transport::PeerEvent;

fn connected_pair() -> (Arc<MockNetwork>, MockRelay, TestParticipant, TestParticipant) {
    let network = MockNetwork::new();
    let relay = MockRelay::new();
    let alice = TestParticipant::new("alice", &network);
    let bob = TestParticipant::new("bob", &network);

    alice.sessions.request_session("bob").unwrap();
    relay.settle(&[&alice, &bob]);
    bob.sessions.accept_session("alice").unwrap();
    relay.settle(&[&alice, &bob]);
    (network, relay, alice, bob)
}

fn files(entries: &[LogEntry]) -> Vec<(&str, &[u8])> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            LogEntry::File {
                file_name, data, ..
            } => Some((file_name.as_str(), data.as_slice())),
            _ => None,
        })
        .collect()
}

#[test]
fn test_file_arrives_once_and_intact() {
    let (_network, relay, alice, bob) = connected_pair();
    let bytes: Vec<u8> = (0..CHUNK_SIZE * 3 + 1234).map(|i| (i % 251) as u8).collect();
    bob.drain_session_events();

    let sent = alice
        .sessions
        .send_file("bob", "notes.bin", "application/octet-stream", &bytes)
        .unwrap();
    relay.settle(&[&alice, &bob]);

    let received = bob.sessions.snapshot("alice").unwrap();
    assert_eq!(files(&received.messages), vec![("notes.bin", bytes.as_slice())]);
    assert_eq!(received.messages[0].id(), sent.id());
    assert_eq!(received.pending_transfers, 0);

    let announced = bob
        .drain_session_events()
        .into_iter()
        .filter(|event| matches!(event, SessionEvent::MessageAdded { .. }))
        .count();
    assert_eq!(announced, 1);

    let own = alice.sessions.snapshot("bob").unwrap();
    assert_eq!(files(&own.messages), vec![("notes.bin", bytes.as_slice())]);
}

#[test]
fn test_empty_file_is_delivered() {
    let (_network, relay, alice, bob) = connected_pair();

    alice
        .sessions
        .send_file("bob", "empty.txt", "text/plain", &[])
        .unwrap();
    relay.settle(&[&alice, &bob]);

    let received = bob.sessions.snapshot("alice").unwrap();
    assert_eq!(files(&received.messages), vec![("empty.txt", &b""[..])]);
}

#[test]
fn test_sender_never_writes_into_a_full_buffer() {
    let channel = Arc::new(MockDataChannel::open("dm"));
    channel.set_auto_drain(false);
    let done = Arc::new(AtomicBool::new(false));

    let drainer = {
        let channel = Arc::clone(&channel);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            while !done.load(Ordering::Acquire) {
                thread::sleep(Duration::from_millis(2));
                channel.drain();
            }
        })
    };

    let sender = FileSender::new(CHUNK_SIZE, MAX_BUFFERED_AMOUNT, logging::Logger::disabled());
    let bytes = vec![42u8; CHUNK_SIZE * 20];
    let file = sender
        .send(channel.as_ref(), "alice", "big.bin", "application/octet-stream", &bytes)
        .unwrap();
    done.store(true, Ordering::Release);
    drainer.join().unwrap();

    assert_eq!(file.total_chunks, 20);
    let observed = channel.buffered_at_send();
    assert_eq!(observed.len(), 21);
    assert!(
        observed.iter().all(|amount| *amount < MAX_BUFFERED_AMOUNT),
        "sent with {:?} bytes buffered",
        observed.iter().max()
    );
    // The buffer did fill up, so the limit was actually exercised.
    assert!(observed.iter().any(|amount| *amount >= MAX_BUFFERED_AMOUNT / 2));
}

#[test]
fn test_abandoned_transfer_is_pruned() {
    let (network, _relay, _alice, bob) = connected_pair();
    let meta = WireMessage::FileMeta {
        id: "transfer-1".to_string(),
        sender_id: "alice".to_string(),
        ts: 0,
        file_name: "half.bin".to_string(),
        file_size: 40_000,
        mime_type: "application/octet-stream".to_string(),
        total_chunks: 3,
    };

    network
        .connection("bob", "alice")
        .unwrap()
        .emit(PeerEvent::ChannelMessage(meta.encode().unwrap()));
    bob.pump();
    assert_eq!(bob.sessions.snapshot("alice").unwrap().pending_transfers, 1);

    assert_eq!(bob.sessions.prune_stale_transfers(Instant::now()), 0);
    let later = Instant::now() + Duration::from_secs(301);
    assert_eq!(bob.sessions.prune_stale_transfers(later), 1);
    assert_eq!(bob.sessions.snapshot("alice").unwrap().pending_transfers, 0);
}

#[test]
fn test_garbage_on_the_channel_is_ignored() {
    let (network, relay, alice, bob) = connected_pair();

    network
        .connection("bob", "alice")
        .unwrap()
        .emit(PeerEvent::ChannelMessage("{not json".to_string()));
    bob.pump();
    alice.sessions.send_text("bob", "still here").unwrap();
    relay.settle(&[&alice, &bob]);

    assert_eq!(bob.sessions.snapshot("alice").unwrap().texts(), vec!["still here"]);
}
