use std::fmt;
use std::sync::Arc;

use signaling_protocol::{CandidateInit, OpaquePayload};

use super::{DataChannel, MediaTrack, TrackKind};
use crate::error::PeerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SdpKind {
    Offer,
    Answer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionDescription {
    pub kind: SdpKind,
    pub sdp: OpaquePayload,
}

impl SessionDescription {
    pub fn offer(sdp: impl Into<OpaquePayload>) -> Self {
        SessionDescription {
            kind: SdpKind::Offer,
            sdp: sdp.into(),
        }
    }

    pub fn answer(sdp: impl Into<OpaquePayload>) -> Self {
        SessionDescription {
            kind: SdpKind::Answer,
            sdp: sdp.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

impl ConnectionState {
    pub fn is_failure(self) -> bool {
        matches!(self, ConnectionState::Disconnected | ConnectionState::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrack {
    pub id: String,
    pub kind: TrackKind,
}

/// Callbacks raised by the platform stack for one peer connection.
pub enum PeerEvent {
    /// A local ICE candidate was gathered.
    LocalCandidate(CandidateInit),
    ConnectionState(ConnectionState),
    /// The remote side created a data channel.
    DataChannel(Arc<dyn DataChannel>),
    ChannelOpen,
    ChannelClosed,
    ChannelMessage(String),
    RemoteTrack(RemoteTrack),
    NegotiationNeeded,
}

impl PeerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            PeerEvent::LocalCandidate(_) => "LocalCandidate",
            PeerEvent::ConnectionState(_) => "ConnectionState",
            PeerEvent::DataChannel(_) => "DataChannel",
            PeerEvent::ChannelOpen => "ChannelOpen",
            PeerEvent::ChannelClosed => "ChannelClosed",
            PeerEvent::ChannelMessage(_) => "ChannelMessage",
            PeerEvent::RemoteTrack(_) => "RemoteTrack",
            PeerEvent::NegotiationNeeded => "NegotiationNeeded",
        }
    }
}

// Message bodies and candidates stay out of log output.
impl fmt::Debug for PeerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerEvent::ConnectionState(state) => write!(f, "ConnectionState({:?})", state),
            PeerEvent::ChannelMessage(text) => write!(f, "ChannelMessage(<{} bytes>)", text.len()),
            PeerEvent::RemoteTrack(track) => write!(f, "RemoteTrack({:?})", track),
            other => f.write_str(other.name()),
        }
    }
}

pub type PeerEventHandler = Arc<dyn Fn(PeerEvent) + Send + Sync>;

/// One platform peer connection.
///
/// Implementations must not call the event handler synchronously from inside
/// these methods while holding their own locks; callers may hold a
/// per-relationship lock across a call.
pub trait PeerConnection: Send + Sync {
    fn create_offer(&self) -> Result<SessionDescription, PeerError>;

    fn create_answer(&self) -> Result<SessionDescription, PeerError>;

    fn set_local_description(&self, description: &SessionDescription) -> Result<(), PeerError>;

    fn set_remote_description(&self, description: &SessionDescription) -> Result<(), PeerError>;

    fn add_ice_candidate(&self, candidate: &CandidateInit) -> Result<(), PeerError>;

    fn create_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannel>, PeerError>;

    fn add_track(&self, track: Arc<dyn MediaTrack>) -> Result<(), PeerError>;

    /// Detaches every local track from its sender.
    fn remove_tracks(&self);

    fn close(&self);
}

pub trait PeerConnectionFactory: Send + Sync {
    /// Creates a connection to `peer_id` whose callbacks go to `on_event`.
    fn create(
        &self,
        peer_id: &str,
        on_event: PeerEventHandler,
    ) -> Result<Arc<dyn PeerConnection>, PeerError>;
}
