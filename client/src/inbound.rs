//! Everything that can wake the client's logic thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;

use signaling_protocol::{Message, ParticipantId};

use crate::peer::SignalScope;
use crate::transport::{PeerEvent, PeerEventHandler};

/// Identifies one peer connection for the lifetime of the process.
pub type LinkId = u64;

static NEXT_LINK_ID: AtomicU64 = AtomicU64::new(1);

pub fn next_link_id() -> LinkId {
    NEXT_LINK_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug)]
pub enum Inbound {
    /// A frame from the relay.
    Relay(Message),
    /// A platform callback for the connection `link_id` to `peer_id`.
    Peer {
        scope: SignalScope,
        peer_id: ParticipantId,
        link_id: LinkId,
        event: PeerEvent,
    },
    /// The relay link dropped. Established peer connections keep working.
    RelayClosed,
    Shutdown,
}

/// Handler that tags platform callbacks with their origin and queues them.
///
/// Callbacks only enqueue, so a platform stack may raise them from any
/// thread, even one the logic thread is blocked on.
pub fn peer_event_handler(
    queue: Sender<Inbound>,
    scope: SignalScope,
    peer_id: &str,
    link_id: LinkId,
) -> PeerEventHandler {
    let peer_id = peer_id.to_string();
    Arc::new(move |event| {
        let _ = queue.send(Inbound::Peer {
            scope: scope.clone(),
            peer_id: peer_id.clone(),
            link_id,
            event,
        });
    })
}
