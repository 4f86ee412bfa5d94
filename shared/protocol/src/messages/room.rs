use serde::{Deserialize, Serialize};

use super::{CandidateInit, OpaquePayload};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMsg {
    pub channel_id: String,
}

/// Members already in the room when the recipient joined, recipient excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRosterMsg {
    pub channel_id: String,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomMemberMsg {
    pub channel_id: String,
    pub participant_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSdpMsg {
    pub channel_id: String,
    pub peer_id: String,
    pub sdp: OpaquePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomIceMsg {
    pub channel_id: String,
    pub peer_id: String,
    pub candidate: CandidateInit,
}
