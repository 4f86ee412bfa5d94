use serde::{Deserialize, Serialize};

/// Payload of every verb that names just the other party.
///
/// Outbound from a client `peer_id` is the target; inbound from the relay it
/// is the participant the event originated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerMsg {
    pub peer_id: String,
}

impl PeerMsg {
    pub fn new(peer_id: impl Into<String>) -> Self {
        PeerMsg {
            peer_id: peer_id.into(),
        }
    }
}
