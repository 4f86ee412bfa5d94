use signaling_protocol::ParticipantId;

use super::{LogEntry, SessionStatus};
use crate::transport::{Profile, RemoteTrack};

/// Notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StatusChanged {
        peer_id: ParticipantId,
        status: SessionStatus,
    },
    IncomingRequest {
        peer: Profile,
    },
    MessageAdded {
        peer_id: ParticipantId,
        entry: LogEntry,
    },
    RemoteTrackAdded {
        peer_id: ParticipantId,
        track: RemoteTrack,
    },
    CallStarted {
        peer_id: ParticipantId,
        with_video: bool,
    },
    CallStopped {
        peer_id: ParticipantId,
    },
    Presence {
        peer_id: ParticipantId,
        online: bool,
    },
}
