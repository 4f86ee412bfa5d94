use signaling_protocol::{ChannelId, ParticipantId};

use super::{LinkStatus, RoomStatus};
use crate::transport::{Profile, RemoteTrack};

#[derive(Debug, Clone, PartialEq)]
pub enum MeshEvent {
    StatusChanged {
        channel_id: Option<ChannelId>,
        status: RoomStatus,
    },
    ParticipantJoined {
        channel_id: ChannelId,
        profile: Profile,
    },
    ParticipantLeft {
        channel_id: ChannelId,
        participant_id: ParticipantId,
    },
    LinkChanged {
        participant_id: ParticipantId,
        link: LinkStatus,
    },
    RemoteTrackAdded {
        participant_id: ParticipantId,
        track: RemoteTrack,
    },
    LocalMediaChanged {
        muted: bool,
        video_enabled: bool,
    },
}
