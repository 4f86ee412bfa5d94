mod common;
mod negotiation;
mod opaque;
mod room;
mod session;

pub use common::{AuthenticateMsg, AuthenticatedMsg, ErrorMsg, OnlineStatusMsg};
pub use negotiation::{CandidateInit, IceMsg, SdpMsg};
pub use opaque::OpaquePayload;
pub use room::{RoomIceMsg, RoomMemberMsg, RoomMsg, RoomRosterMsg, RoomSdpMsg};
pub use session::PeerMsg;
