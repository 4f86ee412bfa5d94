//! Wire vocabulary shared by the relay and its clients.
//!
//! Every frame is `[4 bytes length][1 byte type][N bytes JSON]`, where the
//! length is big-endian and counts the type byte plus the JSON payload.

mod error;
mod framing;
mod message;
mod message_type;
pub mod messages;

pub use error::{ProtocolError, Result};
pub use framing::{MAX_MESSAGE_SIZE, encode_frame, read_message, write_message};
pub use message::Message;
pub use message_type::MessageType;
pub use messages::{
    AuthenticateMsg, AuthenticatedMsg, CandidateInit, ErrorMsg, IceMsg, OnlineStatusMsg,
    OpaquePayload, PeerMsg, RoomIceMsg, RoomMemberMsg, RoomMsg, RoomRosterMsg, RoomSdpMsg, SdpMsg,
};

/// Participant identifiers are opaque strings handed out by the identity
/// provider.
pub type ParticipantId = String;

/// Voice channel identifier scoping a room.
pub type ChannelId = String;
