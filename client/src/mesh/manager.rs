use std::collections::BTreeMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};

use signaling_protocol::{
    CandidateInit, ChannelId, Message, OpaquePayload, ParticipantId, RoomMsg,
};

use super::{LinkStatus, MeshEvent, RoomStatus};
use crate::context::ClientContext;
use crate::error::PeerError;
use crate::inbound::LinkId;
use crate::peer::{PeerConnectionAdapter, Role, SignalScope};
use crate::transport::{
    ConnectionState, MediaConstraints, MediaStream, PeerEvent, Profile, RemoteTrack, TrackKind,
};

/// True when `local` makes the offer to `remote`.
pub fn offers_to(local: &str, remote: &str) -> bool {
    local < remote
}

struct VoicePeer {
    profile: Profile,
    adapter: Arc<PeerConnectionAdapter>,
    link: LinkStatus,
    remote_tracks: Vec<RemoteTrack>,
}

#[derive(Default)]
struct RoomState {
    channel_id: Option<ChannelId>,
    status: RoomStatus,
    local_stream: Option<MediaStream>,
    muted: bool,
    video_enabled: bool,
    peers: BTreeMap<ParticipantId, VoicePeer>,
}

impl RoomState {
    fn is_current(&self, channel_id: &str) -> bool {
        self.channel_id.as_deref() == Some(channel_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantView {
    pub profile: Profile,
    pub link: LinkStatus,
    pub remote_tracks: Vec<RemoteTrack>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub channel_id: Option<ChannelId>,
    pub status: RoomStatus,
    pub muted: bool,
    pub video_enabled: bool,
    pub participants: Vec<ParticipantView>,
}

/// The local participant's presence in at most one voice room.
pub struct VoiceMeshManager {
    ctx: ClientContext,
    room: Mutex<RoomState>,
    events: Sender<MeshEvent>,
    logger: logging::Logger,
}

impl VoiceMeshManager {
    pub fn new(ctx: ClientContext, events: Sender<MeshEvent>) -> Self {
        let logger = ctx.logger.for_component("Voice");
        VoiceMeshManager {
            ctx,
            room: Mutex::new(RoomState::default()),
            events,
            logger,
        }
    }

    pub fn status(&self) -> RoomStatus {
        self.lock().status
    }

    pub fn channel_id(&self) -> Option<ChannelId> {
        self.lock().channel_id.clone()
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let room = self.lock();
        RoomSnapshot {
            channel_id: room.channel_id.clone(),
            status: room.status,
            muted: room.muted,
            video_enabled: room.video_enabled,
            participants: room
                .peers
                .values()
                .map(|peer| ParticipantView {
                    profile: peer.profile.clone(),
                    link: peer.link,
                    remote_tracks: peer.remote_tracks.clone(),
                })
                .collect(),
        }
    }

    /// Joins `channel_id`, leaving any other room first.
    ///
    /// Captures camera and microphone, falling back to the microphone alone.
    /// Failures are reported through the returned status.
    pub fn join_room(&self, channel_id: &str) -> RoomStatus {
        {
            let room = self.lock();
            if room.is_current(channel_id) && room.status == RoomStatus::Active {
                return RoomStatus::Active;
            }
        }
        self.leave_room();

        let mut room = self.lock();
        room.channel_id = Some(channel_id.to_string());
        self.set_status(&mut room, RoomStatus::Joining);

        match self
            .ctx
            .capture
            .acquire_with_fallback(MediaConstraints::AUDIO_VIDEO)
        {
            Ok((stream, with_video)) => {
                room.local_stream = Some(stream);
                room.muted = false;
                room.video_enabled = with_video;
            }
            Err(e) => {
                self.logger
                    .error(&format!("Cannot join {}: no microphone ({})", channel_id, e));
                self.fail_join(&mut room);
                return RoomStatus::Failed;
            }
        }

        let join = Message::JoinRoom(RoomMsg {
            channel_id: channel_id.to_string(),
        });
        if let Err(e) = self.ctx.signaling.send(join) {
            self.logger
                .error(&format!("Cannot join {}: {}", channel_id, e));
            if let Some(stream) = room.local_stream.take() {
                self.ctx.capture.release(&stream);
            }
            self.fail_join(&mut room);
            return RoomStatus::Failed;
        }

        self.set_status(&mut room, RoomStatus::Active);
        RoomStatus::Active
    }

    /// Leaves the current room, closing every pairwise connection and
    /// releasing local capture.
    pub fn leave_room(&self) {
        let mut room = self.lock();
        let Some(channel_id) = room.channel_id.clone() else {
            return;
        };

        let leave = Message::LeaveRoom(RoomMsg {
            channel_id: channel_id.clone(),
        });
        if let Err(e) = self.ctx.signaling.send(leave) {
            self.logger
                .warn(&format!("Could not announce leaving {}: {}", channel_id, e));
        }

        let peers = std::mem::take(&mut room.peers);
        for peer in peers.values() {
            peer.adapter.close();
        }
        if let Some(stream) = room.local_stream.take() {
            self.ctx.capture.release(&stream);
        }

        self.logger.info(&format!(
            "Left {} ({} connection(s) closed)",
            channel_id,
            peers.len()
        ));
        *room = RoomState::default();
        self.emit(MeshEvent::StatusChanged {
            channel_id: None,
            status: RoomStatus::Idle,
        });
    }

    pub fn set_muted(&self, muted: bool) {
        let mut room = self.lock();
        if let Some(stream) = &room.local_stream {
            stream.set_enabled(TrackKind::Audio, !muted);
        }
        room.muted = muted;
        self.emit_local_media(&room);
    }

    pub fn set_video_enabled(&self, enabled: bool) {
        let mut room = self.lock();
        let has_video = match &room.local_stream {
            Some(stream) => {
                stream.set_enabled(TrackKind::Video, enabled);
                stream.has_video()
            }
            None => false,
        };
        room.video_enabled = enabled && has_video;
        self.emit_local_media(&room);
    }

    // ---- relay input ----

    pub fn handle_signal(&self, message: Message) {
        match message {
            Message::RoomRoster(m) => self.on_roster(&m.channel_id, &m.participants),
            Message::RoomUserJoined(m) => self.on_member_joined(&m.channel_id, &m.participant_id),
            Message::RoomUserLeft(m) => self.on_member_left(&m.channel_id, &m.participant_id),
            Message::VoiceOfferReceived(m) => self.on_offer(&m.channel_id, &m.peer_id, m.sdp),
            Message::VoiceAnswerReceived(m) => self.on_answer(&m.channel_id, &m.peer_id, m.sdp),
            Message::VoiceIceCandidateReceived(m) => {
                self.on_remote_candidate(&m.channel_id, &m.peer_id, m.candidate)
            }
            Message::PeerDisconnected(m) => {
                let channel_id = self.channel_id();
                if let Some(channel_id) = channel_id {
                    self.on_member_left(&channel_id, &m.peer_id);
                }
            }
            other => self
                .logger
                .debug(&format!("Ignoring {} in voice manager", other.label())),
        }
    }

    fn on_roster(&self, channel_id: &str, participants: &[ParticipantId]) {
        let mut room = self.lock();
        if !room.is_current(channel_id) {
            self.logger
                .debug(&format!("Ignoring roster of {}: not our room", channel_id));
            return;
        }

        self.logger.info(&format!(
            "Joined {} with {} other participant(s)",
            channel_id,
            participants.len()
        ));
        for peer_id in participants {
            self.connect_member(&mut room, channel_id, peer_id);
        }
    }

    fn on_member_joined(&self, channel_id: &str, peer_id: &str) {
        let mut room = self.lock();
        if !room.is_current(channel_id) {
            return;
        }
        self.connect_member(&mut room, channel_id, peer_id);
    }

    fn connect_member(&self, room: &mut RoomState, channel_id: &str, peer_id: &str) {
        if peer_id == self.ctx.local_id {
            return;
        }
        let Some(adapter) = self.ensure_peer(room, channel_id, peer_id) else {
            return;
        };
        if adapter.is_offerer()
            && let Err(e) = adapter.negotiate()
        {
            self.logger
                .warn(&format!("Offer to {} failed: {}", peer_id, e));
            self.set_link(room, peer_id, LinkStatus::Failed);
        }
    }

    fn on_member_left(&self, channel_id: &str, peer_id: &str) {
        let mut room = self.lock();
        if !room.is_current(channel_id) {
            return;
        }
        if let Some(peer) = room.peers.remove(peer_id) {
            peer.adapter.close();
            self.logger
                .info(&format!("{} left {}", peer_id, channel_id));
            self.emit(MeshEvent::ParticipantLeft {
                channel_id: channel_id.to_string(),
                participant_id: peer_id.to_string(),
            });
        }
    }

    fn on_offer(&self, channel_id: &str, peer_id: &str, sdp: OpaquePayload) {
        let mut room = self.lock();
        if !room.is_current(channel_id) {
            self.logger
                .debug(&format!("Ignoring offer for {}: not our room", channel_id));
            return;
        }
        let Some(adapter) = self.ensure_peer(&mut room, channel_id, peer_id) else {
            return;
        };

        match adapter.handle_remote_offer(sdp) {
            Ok(()) => {}
            Err(PeerError::UnexpectedDescription(_)) => self.logger.warn(&format!(
                "Ignoring offer from {}: we offer to them",
                peer_id
            )),
            Err(e) => {
                self.logger
                    .warn(&format!("Answering {} failed: {}", peer_id, e));
                self.set_link(&mut room, peer_id, LinkStatus::Failed);
            }
        }
    }

    fn on_answer(&self, channel_id: &str, peer_id: &str, sdp: OpaquePayload) {
        let mut room = self.lock();
        if !room.is_current(channel_id) {
            return;
        }
        let Some(adapter) = room.peers.get(peer_id).map(|p| Arc::clone(&p.adapter)) else {
            self.logger
                .debug(&format!("Dropping answer from unknown member {}", peer_id));
            return;
        };

        match adapter.handle_remote_answer(sdp) {
            Ok(()) => {}
            Err(PeerError::UnexpectedDescription(_)) => self
                .logger
                .warn(&format!("Ignoring unsolicited answer from {}", peer_id)),
            Err(e) => {
                self.logger
                    .warn(&format!("Applying answer from {} failed: {}", peer_id, e));
                self.set_link(&mut room, peer_id, LinkStatus::Failed);
            }
        }
    }

    fn on_remote_candidate(&self, channel_id: &str, peer_id: &str, candidate: CandidateInit) {
        let mut room = self.lock();
        if !room.is_current(channel_id) {
            return;
        }
        let Some(adapter) = self.ensure_peer(&mut room, channel_id, peer_id) else {
            return;
        };
        if let Err(e) = adapter.handle_remote_candidate(candidate) {
            self.logger
                .warn(&format!("Candidate from {} rejected: {}", peer_id, e));
        }
    }

    // ---- peer connection callbacks ----

    pub fn handle_peer_event(&self, peer_id: &str, link_id: LinkId, event: PeerEvent) {
        let mut room = self.lock();
        let adapter = match room.peers.get(peer_id) {
            Some(peer) if peer.adapter.link_id() == link_id => Arc::clone(&peer.adapter),
            _ => {
                self.logger.debug(&format!(
                    "Dropping {:?} from a closed connection to {}",
                    event, peer_id
                ));
                return;
            }
        };

        match event {
            PeerEvent::LocalCandidate(candidate) => {
                if let Err(e) = adapter.on_local_candidate(candidate) {
                    self.logger
                        .warn(&format!("Could not forward candidate to {}: {}", peer_id, e));
                }
            }
            PeerEvent::ConnectionState(ConnectionState::Connected) => {
                self.set_link(&mut room, peer_id, LinkStatus::Connected)
            }
            PeerEvent::ConnectionState(state) if state.is_failure() => {
                self.logger
                    .warn(&format!("Connection to {} is {:?}", peer_id, state));
                self.set_link(&mut room, peer_id, LinkStatus::Failed);
            }
            PeerEvent::ConnectionState(_) => {}
            PeerEvent::RemoteTrack(track) => {
                if let Some(peer) = room.peers.get_mut(peer_id)
                    && !peer.remote_tracks.contains(&track)
                {
                    peer.remote_tracks.push(track.clone());
                    self.emit(MeshEvent::RemoteTrackAdded {
                        participant_id: peer_id.to_string(),
                        track,
                    });
                }
            }
            PeerEvent::NegotiationNeeded => {
                if let Err(e) = adapter.negotiate() {
                    self.logger
                        .warn(&format!("Renegotiation with {} failed: {}", peer_id, e));
                }
            }
            other => self
                .logger
                .debug(&format!("Ignoring {:?} on voice link to {}", other, peer_id)),
        }
    }

    // ---- helpers ----

    fn ensure_peer(
        &self,
        room: &mut RoomState,
        channel_id: &str,
        peer_id: &str,
    ) -> Option<Arc<PeerConnectionAdapter>> {
        if let Some(peer) = room.peers.get(peer_id) {
            return Some(Arc::clone(&peer.adapter));
        }

        let role = if offers_to(&self.ctx.local_id, peer_id) {
            Role::Offerer
        } else {
            Role::Answerer
        };
        let adapter = match self
            .ctx
            .connect(peer_id, SignalScope::Room(channel_id.to_string()), role)
        {
            Ok(adapter) => adapter,
            Err(e) => {
                self.logger
                    .warn(&format!("No connection to {} possible: {}", peer_id, e));
                return None;
            }
        };
        if let Some(stream) = &room.local_stream
            && let Err(e) = adapter.add_local_stream(stream)
        {
            self.logger
                .warn(&format!("Could not attach local media for {}: {}", peer_id, e));
        }

        let profile = self.ctx.profile(peer_id, &self.logger);
        self.emit(MeshEvent::ParticipantJoined {
            channel_id: channel_id.to_string(),
            profile: profile.clone(),
        });
        room.peers.insert(
            peer_id.to_string(),
            VoicePeer {
                profile,
                adapter: Arc::clone(&adapter),
                link: LinkStatus::Connecting,
                remote_tracks: Vec::new(),
            },
        );
        Some(adapter)
    }

    fn set_link(&self, room: &mut RoomState, peer_id: &str, link: LinkStatus) {
        if let Some(peer) = room.peers.get_mut(peer_id)
            && peer.link != link
        {
            peer.link = link;
            self.emit(MeshEvent::LinkChanged {
                participant_id: peer_id.to_string(),
                link,
            });
        }
    }

    /// A failed join keeps no channel, so late signals for it are dropped.
    fn fail_join(&self, room: &mut RoomState) {
        self.set_status(room, RoomStatus::Failed);
        room.channel_id = None;
    }

    fn set_status(&self, room: &mut RoomState, status: RoomStatus) {
        if room.status == status {
            return;
        }
        self.logger.info(&format!(
            "Room {}: {} -> {}",
            room.channel_id.as_deref().unwrap_or("-"),
            room.status,
            status
        ));
        room.status = status;
        self.emit(MeshEvent::StatusChanged {
            channel_id: room.channel_id.clone(),
            status,
        });
    }

    fn emit_local_media(&self, room: &RoomState) {
        self.emit(MeshEvent::LocalMediaChanged {
            muted: room.muted,
            video_enabled: room.video_enabled,
        });
    }

    fn emit(&self, event: MeshEvent) {
        let _ = self.events.send(event);
    }

    fn lock(&self) -> MutexGuard<'_, RoomState> {
        match self.room.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
