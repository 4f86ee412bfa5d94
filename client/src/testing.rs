//! In-process stand-ins for the relay link, the platform WebRTC stack and
//! the capture devices.
//!
//! [`MockNetwork`] connects the mock peer connections of several local
//! clients: once an offerer applies an answer, both ends report the link as
//! connected, data channels opened by the offerer appear on the answering
//! side and each side sees the other's tracks. [`TestParticipant`] bundles
//! both managers over these mocks and [`MockRelay`] moves signaling between
//! participants, all driven step by step from the calling thread.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, Weak};

use signaling_protocol::{
    CandidateInit, ChannelId, IceMsg, Message, OnlineStatusMsg, ParticipantId, PeerMsg,
    RoomIceMsg, RoomMemberMsg, RoomRosterMsg, RoomSdpMsg, SdpMsg,
};

use crate::config::{SessionConfig, TransferConfig};
use crate::context::ClientContext;
use crate::error::{ClientError, MediaError, PeerError, Result};
use crate::inbound::Inbound;
use crate::mesh::{MeshEvent, VoiceMeshManager};
use crate::router::EventRouter;
use crate::session::{DirectSessionManager, SessionEvent};
use crate::transport::{
    ConnectionState, DataChannel, ExclusiveCapture, MediaConstraints, MediaDevices, MediaStream,
    MediaTrack, PeerConnection, PeerConnectionFactory, PeerEvent, PeerEventHandler, RemoteTrack,
    SdpKind, SessionDescription, SignalingSink, StaticDirectory, TrackKind,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Signaling sink that keeps everything it is asked to send.
#[derive(Default)]
pub struct RecordingSignaling {
    sent: Mutex<Vec<Message>>,
    failing: AtomicBool,
}

impl RecordingSignaling {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Message> {
        lock(&self.sent).clone()
    }

    /// Returns and forgets everything sent so far.
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *lock(&self.sent))
    }

    /// While failing, every send reports a closed relay.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl SignalingSink for RecordingSignaling {
    fn send(&self, message: Message) -> Result<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(ClientError::RelayClosed);
        }
        lock(&self.sent).push(message);
        Ok(())
    }
}

struct ChannelState {
    open: bool,
    sent: Vec<String>,
    buffered: usize,
    buffered_at_send: Vec<usize>,
    auto_drain: bool,
}

/// Data channel with a scriptable send buffer.
///
/// With auto-drain on (the default) sends leave the buffer empty. With it
/// off every send adds its length to the buffered amount until
/// [`drain`](MockDataChannel::drain) is called.
pub struct MockDataChannel {
    label: String,
    state: Mutex<ChannelState>,
    changed: Condvar,
    owner: Option<PeerEventHandler>,
    remote: Mutex<Option<Weak<MockDataChannel>>>,
}

impl MockDataChannel {
    /// A standalone channel that is already open.
    pub fn open(label: &str) -> Self {
        Self::build(label, true, None)
    }

    fn pending(label: &str, owner: PeerEventHandler) -> Self {
        Self::build(label, false, Some(owner))
    }

    fn build(label: &str, open: bool, owner: Option<PeerEventHandler>) -> Self {
        MockDataChannel {
            label: label.to_string(),
            state: Mutex::new(ChannelState {
                open,
                sent: Vec::new(),
                buffered: 0,
                buffered_at_send: Vec::new(),
                auto_drain: true,
            }),
            changed: Condvar::new(),
            owner,
            remote: Mutex::new(None),
        }
    }

    /// Links two ends and opens both.
    fn pair(local: &Arc<MockDataChannel>, remote: &Arc<MockDataChannel>) {
        *lock(&local.remote) = Some(Arc::downgrade(remote));
        *lock(&remote.remote) = Some(Arc::downgrade(local));
        for end in [local, remote] {
            lock(&end.state).open = true;
            end.changed.notify_all();
        }
    }

    pub fn sent(&self) -> Vec<String> {
        lock(&self.state).sent.clone()
    }

    /// Buffered amount observed right before each send.
    pub fn buffered_at_send(&self) -> Vec<usize> {
        lock(&self.state).buffered_at_send.clone()
    }

    pub fn set_auto_drain(&self, auto_drain: bool) {
        lock(&self.state).auto_drain = auto_drain;
    }

    /// Puts everything buffered on the wire.
    pub fn drain(&self) {
        lock(&self.state).buffered = 0;
        self.changed.notify_all();
    }

    fn notify(&self, event: PeerEvent) {
        if let Some(owner) = &self.owner {
            owner(event);
        }
    }
}

impl DataChannel for MockDataChannel {
    fn label(&self) -> &str {
        &self.label
    }

    fn send_text(&self, text: &str) -> std::result::Result<(), PeerError> {
        {
            let mut state = lock(&self.state);
            if !state.open {
                return Err(PeerError::Channel(format!("'{}' is not open", self.label)));
            }
            let before = state.buffered;
            state.buffered_at_send.push(before);
            state.sent.push(text.to_string());
            if !state.auto_drain {
                state.buffered += text.len();
            }
        }

        let remote = lock(&self.remote).as_ref().and_then(Weak::upgrade);
        if let Some(remote) = remote {
            remote.notify(PeerEvent::ChannelMessage(text.to_string()));
        }
        Ok(())
    }

    fn buffered_amount(&self) -> usize {
        lock(&self.state).buffered
    }

    fn is_open(&self) -> bool {
        lock(&self.state).open
    }

    /// Closes this end and then the paired one; each reports to its owner.
    fn close(&self) {
        let was_open = {
            let mut state = lock(&self.state);
            std::mem::replace(&mut state.open, false)
        };
        self.changed.notify_all();
        if !was_open {
            return;
        }

        self.notify(PeerEvent::ChannelClosed);
        let remote = lock(&self.remote).take().and_then(|weak| weak.upgrade());
        if let Some(remote) = remote {
            remote.close();
        }
    }

    fn wait_buffered_below(&self, threshold: usize) -> bool {
        let mut state = lock(&self.state);
        loop {
            if !state.open {
                return false;
            }
            if state.buffered < threshold {
                return true;
            }
            state = match self.changed.wait(state) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }
}

pub struct MockTrack {
    id: String,
    kind: TrackKind,
    enabled: AtomicBool,
    live: AtomicBool,
}

impl MockTrack {
    pub fn new(id: impl Into<String>, kind: TrackKind) -> Self {
        MockTrack {
            id: id.into(),
            kind,
            enabled: AtomicBool::new(true),
            live: AtomicBool::new(true),
        }
    }
}

impl MediaTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Release);
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    fn stop(&self) {
        self.live.store(false, Ordering::Release);
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

/// Capture devices whose camera and microphone can be unplugged.
pub struct MockMedia {
    owner: String,
    captures: AtomicUsize,
    camera: AtomicBool,
    microphone: AtomicBool,
    issued: Mutex<Vec<Arc<MockTrack>>>,
}

impl MockMedia {
    pub fn new(owner: &str) -> Self {
        MockMedia {
            owner: owner.to_string(),
            captures: AtomicUsize::new(0),
            camera: AtomicBool::new(true),
            microphone: AtomicBool::new(true),
            issued: Mutex::new(Vec::new()),
        }
    }

    pub fn set_camera_available(&self, available: bool) {
        self.camera.store(available, Ordering::Release);
    }

    pub fn set_microphone_available(&self, available: bool) {
        self.microphone.store(available, Ordering::Release);
    }

    /// Tracks handed out and not stopped yet.
    pub fn live_tracks(&self) -> usize {
        lock(&self.issued).iter().filter(|t| t.is_live()).count()
    }

    pub fn issued(&self) -> Vec<Arc<MockTrack>> {
        lock(&self.issued).clone()
    }
}

impl MediaDevices for MockMedia {
    fn acquire(&self, constraints: MediaConstraints) -> std::result::Result<MediaStream, MediaError> {
        if constraints.video && !self.camera.load(Ordering::Acquire) {
            return Err(MediaError::Unavailable("camera".to_string()));
        }
        if constraints.audio && !self.microphone.load(Ordering::Acquire) {
            return Err(MediaError::PermissionDenied("microphone".to_string()));
        }

        let n = self.captures.fetch_add(1, Ordering::Relaxed);
        let mut tracks = Vec::new();
        if constraints.audio {
            tracks.push(Arc::new(MockTrack::new(
                format!("{}-audio-{}", self.owner, n),
                TrackKind::Audio,
            )));
        }
        if constraints.video {
            tracks.push(Arc::new(MockTrack::new(
                format!("{}-video-{}", self.owner, n),
                TrackKind::Video,
            )));
        }

        lock(&self.issued).extend(tracks.iter().cloned());
        Ok(MediaStream::new(
            tracks
                .into_iter()
                .map(|t| t as Arc<dyn MediaTrack>)
                .collect(),
        ))
    }
}

#[derive(Default)]
struct LinkState {
    local: Option<SessionDescription>,
    remote: Option<SessionDescription>,
    candidates: Vec<String>,
    channels: Vec<Arc<MockDataChannel>>,
    paired_channels: usize,
    tracks: Vec<Arc<dyn MediaTrack>>,
    offers: usize,
    connected: bool,
    closed: bool,
}

/// One side of a mock peer connection, registered as `owner -> peer`.
pub struct MockPeerConnection {
    owner: ParticipantId,
    peer: ParticipantId,
    handler: PeerEventHandler,
    network: Weak<MockNetwork>,
    state: Mutex<LinkState>,
    failing: AtomicBool,
}

impl MockPeerConnection {
    /// Remote candidates in the order they were applied.
    pub fn applied_candidates(&self) -> Vec<String> {
        lock(&self.state).candidates.clone()
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    pub fn is_connected(&self) -> bool {
        lock(&self.state).connected
    }

    pub fn local_track_ids(&self) -> Vec<String> {
        lock(&self.state)
            .tracks
            .iter()
            .map(|t| t.id().to_string())
            .collect()
    }

    pub fn offers_created(&self) -> usize {
        lock(&self.state).offers
    }

    /// While failing, creating or applying descriptions errors out.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Raises `event` as if the platform stack had.
    pub fn emit(&self, event: PeerEvent) {
        (self.handler)(event);
    }

    fn check(&self, what: &str) -> std::result::Result<(), PeerError> {
        if lock(&self.state).closed {
            return Err(PeerError::Closed);
        }
        if self.failing.load(Ordering::Acquire) {
            return Err(PeerError::Negotiation(format!("{} failed", what)));
        }
        Ok(())
    }

    /// Marks the connection up. True the first time.
    fn mark_connected(&self) -> bool {
        let mut state = lock(&self.state);
        !std::mem::replace(&mut state.connected, true)
    }

    fn take_unpaired_channels(&self) -> Vec<Arc<MockDataChannel>> {
        let mut state = lock(&self.state);
        let unpaired = state.channels[state.paired_channels..].to_vec();
        state.paired_channels = state.channels.len();
        unpaired
    }

    fn adopt_channel(&self, channel: Arc<MockDataChannel>) {
        let mut state = lock(&self.state);
        state.channels.push(channel);
        state.paired_channels = state.channels.len();
    }

    fn remote_view(&self) -> Vec<RemoteTrack> {
        lock(&self.state)
            .tracks
            .iter()
            .map(|t| RemoteTrack {
                id: t.id().to_string(),
                kind: t.kind(),
            })
            .collect()
    }
}

impl PeerConnection for MockPeerConnection {
    fn create_offer(&self) -> std::result::Result<SessionDescription, PeerError> {
        self.check("create offer")?;
        let mut state = lock(&self.state);
        state.offers += 1;
        Ok(SessionDescription::offer(format!(
            "offer {} -> {} #{}",
            self.owner, self.peer, state.offers
        )))
    }

    fn create_answer(&self) -> std::result::Result<SessionDescription, PeerError> {
        self.check("create answer")?;
        let state = lock(&self.state);
        if !matches!(&state.remote, Some(d) if d.kind == SdpKind::Offer) {
            return Err(PeerError::Negotiation("no remote offer to answer".to_string()));
        }
        Ok(SessionDescription::answer(format!(
            "answer {} -> {}",
            self.owner, self.peer
        )))
    }

    fn set_local_description(
        &self,
        description: &SessionDescription,
    ) -> std::result::Result<(), PeerError> {
        self.check("set local description")?;
        lock(&self.state).local = Some(description.clone());
        self.emit(PeerEvent::LocalCandidate(CandidateInit::new(format!(
            "candidate:{} 1 udp host",
            self.owner
        ))));
        Ok(())
    }

    fn set_remote_description(
        &self,
        description: &SessionDescription,
    ) -> std::result::Result<(), PeerError> {
        self.check("set remote description")?;
        lock(&self.state).remote = Some(description.clone());
        if description.kind == SdpKind::Answer
            && let Some(network) = self.network.upgrade()
        {
            network.link(&self.owner, &self.peer);
        }
        Ok(())
    }

    fn add_ice_candidate(&self, candidate: &CandidateInit) -> std::result::Result<(), PeerError> {
        let mut state = lock(&self.state);
        if state.closed {
            return Err(PeerError::Closed);
        }
        if state.remote.is_none() {
            return Err(PeerError::Candidate(
                "remote description not set".to_string(),
            ));
        }
        state
            .candidates
            .push(candidate.candidate.expose().to_string());
        Ok(())
    }

    fn create_data_channel(&self, label: &str) -> std::result::Result<Arc<dyn DataChannel>, PeerError> {
        self.check("create data channel")?;
        let channel = Arc::new(MockDataChannel::pending(label, Arc::clone(&self.handler)));
        lock(&self.state).channels.push(Arc::clone(&channel));
        Ok(channel)
    }

    fn add_track(&self, track: Arc<dyn MediaTrack>) -> std::result::Result<(), PeerError> {
        self.check("add track")?;
        lock(&self.state).tracks.push(track);
        Ok(())
    }

    fn remove_tracks(&self) {
        lock(&self.state).tracks.clear();
    }

    fn close(&self) {
        let channels = {
            let mut state = lock(&self.state);
            state.closed = true;
            state.connected = false;
            std::mem::take(&mut state.channels)
        };
        for channel in channels {
            channel.close();
        }
    }
}

/// Shared medium for the mock connections of every local participant.
#[derive(Default)]
pub struct MockNetwork {
    connections: Mutex<HashMap<(ParticipantId, ParticipantId), Arc<MockPeerConnection>>>,
}

impl MockNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Factory for the connections `owner` creates.
    pub fn factory(self: &Arc<Self>, owner: &str) -> Arc<MockConnectionFactory> {
        Arc::new(MockConnectionFactory {
            owner: owner.to_string(),
            network: Arc::clone(self),
            failing: AtomicBool::new(false),
        })
    }

    /// The latest connection `owner` created towards `peer`.
    pub fn connection(&self, owner: &str, peer: &str) -> Option<Arc<MockPeerConnection>> {
        lock(&self.connections)
            .get(&(owner.to_string(), peer.to_string()))
            .cloned()
    }

    fn register(&self, connection: Arc<MockPeerConnection>) {
        let key = (connection.owner.clone(), connection.peer.clone());
        lock(&self.connections).insert(key, connection);
    }

    /// Called when `offerer` applied the answer of `answerer`.
    fn link(&self, offerer: &str, answerer: &str) {
        let (Some(local), Some(remote)) = (
            self.connection(offerer, answerer),
            self.connection(answerer, offerer),
        ) else {
            return;
        };
        if local.is_closed() || remote.is_closed() {
            return;
        }

        let first_local = local.mark_connected();
        let first_remote = remote.mark_connected();
        if first_local {
            local.emit(PeerEvent::ConnectionState(ConnectionState::Connected));
        }
        if first_remote {
            remote.emit(PeerEvent::ConnectionState(ConnectionState::Connected));
        }

        for channel in local.take_unpaired_channels() {
            let far_end = Arc::new(MockDataChannel::pending(
                channel.label(),
                Arc::clone(&remote.handler),
            ));
            MockDataChannel::pair(&channel, &far_end);
            remote.adopt_channel(Arc::clone(&far_end));
            remote.emit(PeerEvent::DataChannel(far_end));
            remote.emit(PeerEvent::ChannelOpen);
            local.emit(PeerEvent::ChannelOpen);
        }

        for track in local.remote_view() {
            remote.emit(PeerEvent::RemoteTrack(track));
        }
        for track in remote.remote_view() {
            local.emit(PeerEvent::RemoteTrack(track));
        }
    }
}

pub struct MockConnectionFactory {
    owner: ParticipantId,
    network: Arc<MockNetwork>,
    failing: AtomicBool,
}

impl MockConnectionFactory {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }
}

impl PeerConnectionFactory for MockConnectionFactory {
    fn create(
        &self,
        peer_id: &str,
        on_event: PeerEventHandler,
    ) -> std::result::Result<Arc<dyn PeerConnection>, PeerError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(PeerError::Negotiation("no ICE servers reachable".to_string()));
        }

        let connection = Arc::new(MockPeerConnection {
            owner: self.owner.clone(),
            peer: peer_id.to_string(),
            handler: on_event,
            network: Arc::downgrade(&self.network),
            state: Mutex::new(LinkState::default()),
            failing: AtomicBool::new(false),
        });
        self.network.register(Arc::clone(&connection));
        Ok(connection)
    }
}

/// A participant whose managers run over mocks and whose logic thread is
/// the caller: nothing happens until [`pump`](TestParticipant::pump) or
/// [`deliver`](TestParticipant::deliver) is called.
pub struct TestParticipant {
    pub id: ParticipantId,
    pub sessions: Arc<DirectSessionManager>,
    pub mesh: Arc<VoiceMeshManager>,
    pub signaling: Arc<RecordingSignaling>,
    pub media: Arc<MockMedia>,
    pub factory: Arc<MockConnectionFactory>,
    pub session_events: Receiver<SessionEvent>,
    pub mesh_events: Receiver<MeshEvent>,
    router: EventRouter,
    inbound: Receiver<Inbound>,
}

impl TestParticipant {
    pub fn new(id: &str, network: &Arc<MockNetwork>) -> Self {
        Self::with_config(
            id,
            network,
            &SessionConfig::default(),
            &TransferConfig::default(),
        )
    }

    pub fn with_config(
        id: &str,
        network: &Arc<MockNetwork>,
        session_config: &SessionConfig,
        transfer_config: &TransferConfig,
    ) -> Self {
        let logger = logging::Logger::disabled();
        let (inbound_tx, inbound) = mpsc::channel();
        let signaling = Arc::new(RecordingSignaling::new());
        let media = Arc::new(MockMedia::new(id));
        let factory = network.factory(id);

        let ctx = ClientContext {
            local_id: id.to_string(),
            signaling: signaling.clone(),
            factory: factory.clone(),
            directory: Arc::new(StaticDirectory::new()),
            capture: Arc::new(ExclusiveCapture::new(media.clone(), logger.clone())),
            inbound: inbound_tx,
            logger: logger.clone(),
        };

        let (session_tx, session_events) = mpsc::channel();
        let (mesh_tx, mesh_events) = mpsc::channel();
        let sessions = Arc::new(DirectSessionManager::new(
            ctx.clone(),
            session_config,
            transfer_config,
            session_tx,
        ));
        let mesh = Arc::new(VoiceMeshManager::new(ctx, mesh_tx));
        let router = EventRouter::new(
            Arc::clone(&sessions),
            Arc::clone(&mesh),
            signaling.clone(),
            logger,
        );

        TestParticipant {
            id: id.to_string(),
            sessions,
            mesh,
            signaling,
            media,
            factory,
            session_events,
            mesh_events,
            router,
            inbound,
        }
    }

    /// Routes every queued peer callback. Returns how many there were.
    pub fn pump(&self) -> usize {
        let mut handled = 0;
        while let Ok(item) = self.inbound.try_recv() {
            self.router.route(item);
            handled += 1;
        }
        handled
    }

    /// Hands a relay message to the participant as if it came off the wire.
    pub fn deliver(&self, message: Message) {
        self.router.route(Inbound::Relay(message));
    }

    pub fn drain_session_events(&self) -> Vec<SessionEvent> {
        self.session_events.try_iter().collect()
    }

    pub fn drain_mesh_events(&self) -> Vec<MeshEvent> {
        self.mesh_events.try_iter().collect()
    }
}

/// Relay semantics between [`TestParticipant`]s: verbs are attributed to
/// their source and rooms fan out joins and departures.
#[derive(Default)]
pub struct MockRelay {
    rooms: Mutex<BTreeMap<ChannelId, Vec<ParticipantId>>>,
}

impl MockRelay {
    /// Upper bound on exchange rounds before [`settle`](MockRelay::settle)
    /// gives up on a conversation that never goes quiet.
    const MAX_ROUNDS: usize = 1000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Pumps callbacks and forwards signaling until nothing moves. Only
    /// participants in `online` are reachable.
    pub fn settle(&self, online: &[&TestParticipant]) {
        for _ in 0..Self::MAX_ROUNDS {
            let mut moved = 0;
            for participant in online {
                moved += participant.pump();
                for message in participant.signaling.take() {
                    moved += 1;
                    self.forward(participant, message, online);
                }
            }
            if moved == 0 {
                return;
            }
        }
    }

    /// Announces that `gone` dropped off the relay.
    pub fn disconnect(&self, gone: &str, online: &[&TestParticipant]) {
        let left: Vec<ChannelId> = {
            let mut rooms = lock(&self.rooms);
            rooms
                .iter_mut()
                .filter_map(|(channel_id, members)| {
                    let before = members.len();
                    members.retain(|m| m != gone);
                    (members.len() != before).then(|| channel_id.clone())
                })
                .collect()
        };

        for participant in online.iter().filter(|p| p.id != gone) {
            for channel_id in &left {
                participant.deliver(Message::RoomUserLeft(RoomMemberMsg {
                    channel_id: channel_id.clone(),
                    participant_id: gone.to_string(),
                }));
            }
            participant.deliver(Message::PeerDisconnected(PeerMsg::new(gone)));
        }
    }

    pub fn members(&self, channel_id: &str) -> Vec<ParticipantId> {
        lock(&self.rooms)
            .get(channel_id)
            .cloned()
            .unwrap_or_default()
    }

    fn forward(&self, source: &TestParticipant, message: Message, online: &[&TestParticipant]) {
        let find = |id: &str| online.iter().find(|p| p.id == id);
        let from = source.id.clone();
        let to = |target: &str, message: Message| {
            if let Some(target) = find(target) {
                target.deliver(message);
            }
        };

        match message {
            Message::RequestSession(m) => match find(&m.peer_id) {
                Some(target) => target.deliver(Message::SessionRequested(PeerMsg::new(from))),
                None => source.deliver(Message::PeerUnavailable(m)),
            },
            Message::AcceptSession(m) => to(&m.peer_id, Message::SessionAccepted(PeerMsg::new(from))),
            Message::RejectSession(m) => to(&m.peer_id, Message::SessionRejected(PeerMsg::new(from))),
            Message::EndSession(m) => to(&m.peer_id, Message::SessionEnded(PeerMsg::new(from))),
            Message::Offer(m) => to(
                &m.peer_id,
                Message::OfferReceived(SdpMsg {
                    peer_id: from,
                    sdp: m.sdp,
                }),
            ),
            Message::Answer(m) => to(
                &m.peer_id,
                Message::AnswerReceived(SdpMsg {
                    peer_id: from,
                    sdp: m.sdp,
                }),
            ),
            Message::IceCandidate(m) => to(
                &m.peer_id,
                Message::IceCandidateReceived(IceMsg {
                    peer_id: from,
                    candidate: m.candidate,
                }),
            ),
            Message::IsOnline(m) => {
                let online = find(&m.peer_id).is_some();
                source.deliver(Message::OnlineStatus(OnlineStatusMsg {
                    peer_id: m.peer_id,
                    online,
                }));
            }
            Message::JoinRoom(m) => {
                let existing = {
                    let mut rooms = lock(&self.rooms);
                    let members = rooms.entry(m.channel_id.clone()).or_default();
                    let existing: Vec<_> = members.iter().filter(|id| **id != from).cloned().collect();
                    if !members.contains(&from) {
                        members.push(from.clone());
                    }
                    existing
                };
                for member in &existing {
                    to(
                        member,
                        Message::RoomUserJoined(RoomMemberMsg {
                            channel_id: m.channel_id.clone(),
                            participant_id: from.clone(),
                        }),
                    );
                }
                source.deliver(Message::RoomRoster(RoomRosterMsg {
                    channel_id: m.channel_id,
                    participants: existing,
                }));
            }
            Message::LeaveRoom(m) => {
                let remaining = {
                    let mut rooms = lock(&self.rooms);
                    let members = rooms.entry(m.channel_id.clone()).or_default();
                    members.retain(|id| *id != from);
                    members.clone()
                };
                for member in &remaining {
                    to(
                        member,
                        Message::RoomUserLeft(RoomMemberMsg {
                            channel_id: m.channel_id.clone(),
                            participant_id: from.clone(),
                        }),
                    );
                }
            }
            Message::VoiceOffer(m) => to(
                &m.peer_id,
                Message::VoiceOfferReceived(RoomSdpMsg {
                    channel_id: m.channel_id,
                    peer_id: from,
                    sdp: m.sdp,
                }),
            ),
            Message::VoiceAnswer(m) => to(
                &m.peer_id,
                Message::VoiceAnswerReceived(RoomSdpMsg {
                    channel_id: m.channel_id,
                    peer_id: from,
                    sdp: m.sdp,
                }),
            ),
            Message::VoiceIceCandidate(m) => to(
                &m.peer_id,
                Message::VoiceIceCandidateReceived(RoomIceMsg {
                    channel_id: m.channel_id,
                    peer_id: from,
                    candidate: m.candidate,
                }),
            ),
            _ => {}
        }
    }
}
