//! Negotiation rules around one platform peer connection.
//!
//! Only the offerer ever creates offers, and at most one offer per connection
//! is outstanding: a trigger that arrives while an offer awaits its answer is
//! remembered and turned into exactly one follow-up offer once the answer is
//! applied. Remote ICE candidates that arrive before the remote description
//! are queued and applied, in arrival order, right after it is set.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use signaling_protocol::{
    CandidateInit, ChannelId, IceMsg, Message, OpaquePayload, ParticipantId, RoomIceMsg,
    RoomSdpMsg, SdpMsg,
};

use crate::error::PeerError;
use crate::inbound::LinkId;
use crate::transport::{
    DataChannel, MediaStream, PeerConnection, SessionDescription, SignalingSink,
};

/// Which relay verbs carry this connection's negotiation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SignalScope {
    Direct,
    Room(ChannelId),
}

impl SignalScope {
    fn offer(&self, peer_id: &str, sdp: OpaquePayload) -> Message {
        match self {
            SignalScope::Direct => Message::Offer(SdpMsg {
                peer_id: peer_id.to_string(),
                sdp,
            }),
            SignalScope::Room(channel_id) => Message::VoiceOffer(RoomSdpMsg {
                channel_id: channel_id.clone(),
                peer_id: peer_id.to_string(),
                sdp,
            }),
        }
    }

    fn answer(&self, peer_id: &str, sdp: OpaquePayload) -> Message {
        match self {
            SignalScope::Direct => Message::Answer(SdpMsg {
                peer_id: peer_id.to_string(),
                sdp,
            }),
            SignalScope::Room(channel_id) => Message::VoiceAnswer(RoomSdpMsg {
                channel_id: channel_id.clone(),
                peer_id: peer_id.to_string(),
                sdp,
            }),
        }
    }

    fn candidate(&self, peer_id: &str, candidate: CandidateInit) -> Message {
        match self {
            SignalScope::Direct => Message::IceCandidate(IceMsg {
                peer_id: peer_id.to_string(),
                candidate,
            }),
            SignalScope::Room(channel_id) => Message::VoiceIceCandidate(RoomIceMsg {
                channel_id: channel_id.clone(),
                peer_id: peer_id.to_string(),
                candidate,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Offerer,
    Answerer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// A fresh offer went out.
    Sent,
    /// An offer is already awaiting its answer; one follow-up is scheduled.
    Coalesced,
    /// Answerers never originate descriptions.
    NotOfferer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateDisposition {
    Applied,
    Queued,
}

struct IceState {
    remote_description_set: bool,
    pending: VecDeque<CandidateInit>,
}

pub struct PeerConnectionAdapter {
    peer_id: ParticipantId,
    scope: SignalScope,
    role: Role,
    link_id: LinkId,
    connection: Arc<dyn PeerConnection>,
    signaling: Arc<dyn SignalingSink>,
    negotiating: AtomicBool,
    follow_up: AtomicBool,
    closed: AtomicBool,
    ice: Mutex<IceState>,
    data_channel: Mutex<Option<Arc<dyn DataChannel>>>,
    logger: logging::Logger,
}

impl PeerConnectionAdapter {
    pub fn new(
        peer_id: &str,
        scope: SignalScope,
        role: Role,
        link_id: LinkId,
        connection: Arc<dyn PeerConnection>,
        signaling: Arc<dyn SignalingSink>,
        logger: logging::Logger,
    ) -> Self {
        PeerConnectionAdapter {
            peer_id: peer_id.to_string(),
            scope,
            role,
            link_id,
            connection,
            signaling,
            negotiating: AtomicBool::new(false),
            follow_up: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            ice: Mutex::new(IceState {
                remote_description_set: false,
                pending: VecDeque::new(),
            }),
            data_channel: Mutex::new(None),
            logger,
        }
    }

    pub fn peer_id(&self) -> &str {
        &self.peer_id
    }

    pub fn scope(&self) -> &SignalScope {
        &self.scope
    }

    /// Tags callbacks so events from a replaced connection can be told apart.
    pub fn link_id(&self) -> LinkId {
        self.link_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_offerer(&self) -> bool {
        self.role == Role::Offerer
    }

    pub fn is_negotiating(&self) -> bool {
        self.negotiating.load(Ordering::Acquire)
    }

    pub fn pending_candidates(&self) -> usize {
        self.lock_ice().pending.len()
    }

    /// Starts an offer/answer round if this side is the offerer and no round
    /// is in flight.
    pub fn negotiate(&self) -> Result<NegotiationOutcome, PeerError> {
        if self.role != Role::Offerer {
            self.logger.debug(&format!(
                "Not renegotiating with {}: waiting for the offerer",
                self.peer_id
            ));
            return Ok(NegotiationOutcome::NotOfferer);
        }
        if self.closed.load(Ordering::Acquire) {
            return Err(PeerError::Closed);
        }

        if self
            .negotiating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.follow_up.store(true, Ordering::Release);
            self.logger.debug(&format!(
                "Offer to {} still unanswered, coalescing trigger",
                self.peer_id
            ));
            return Ok(NegotiationOutcome::Coalesced);
        }

        match self.send_offer() {
            Ok(()) => {
                self.logger.info(&format!("Offer sent to {}", self.peer_id));
                Ok(NegotiationOutcome::Sent)
            }
            Err(e) => {
                self.negotiating.store(false, Ordering::Release);
                Err(e)
            }
        }
    }

    fn send_offer(&self) -> Result<(), PeerError> {
        let offer = self.connection.create_offer()?;
        self.connection.set_local_description(&offer)?;
        self.signal(self.scope.offer(&self.peer_id, offer.sdp))
    }

    /// Applies a remote offer and replies with an answer.
    pub fn handle_remote_offer(&self, sdp: OpaquePayload) -> Result<(), PeerError> {
        if self.role == Role::Offerer {
            return Err(PeerError::UnexpectedDescription("offer"));
        }

        self.apply_remote_description(&SessionDescription::offer(sdp))?;
        let answer = self.connection.create_answer()?;
        self.connection.set_local_description(&answer)?;
        self.signal(self.scope.answer(&self.peer_id, answer.sdp))?;

        self.logger.info(&format!("Answer sent to {}", self.peer_id));
        Ok(())
    }

    /// Completes the in-flight round, then runs the coalesced follow-up if a
    /// trigger arrived meanwhile.
    pub fn handle_remote_answer(&self, sdp: OpaquePayload) -> Result<(), PeerError> {
        if self.role != Role::Offerer || !self.is_negotiating() {
            return Err(PeerError::UnexpectedDescription("answer"));
        }

        let applied = self.apply_remote_description(&SessionDescription::answer(sdp));
        self.negotiating.store(false, Ordering::Release);
        applied?;
        self.logger
            .debug(&format!("Answer from {} applied", self.peer_id));

        if self.follow_up.swap(false, Ordering::AcqRel) {
            self.negotiate()?;
        }
        Ok(())
    }

    pub fn handle_remote_candidate(
        &self,
        candidate: CandidateInit,
    ) -> Result<CandidateDisposition, PeerError> {
        let mut ice = self.lock_ice();
        if !ice.remote_description_set {
            ice.pending.push_back(candidate);
            return Ok(CandidateDisposition::Queued);
        }
        self.connection.add_ice_candidate(&candidate)?;
        Ok(CandidateDisposition::Applied)
    }

    /// Forwards a locally gathered candidate right away.
    pub fn on_local_candidate(&self, candidate: CandidateInit) -> Result<(), PeerError> {
        self.signal(self.scope.candidate(&self.peer_id, candidate))
    }

    // The ICE lock is held across set + drain so no candidate can slip in
    // between and be applied out of order.
    fn apply_remote_description(&self, description: &SessionDescription) -> Result<(), PeerError> {
        let mut ice = self.lock_ice();
        self.connection.set_remote_description(description)?;
        ice.remote_description_set = true;

        let queued = ice.pending.len();
        while let Some(candidate) = ice.pending.pop_front() {
            if let Err(e) = self.connection.add_ice_candidate(&candidate) {
                self.logger.warn(&format!(
                    "Dropping queued candidate from {}: {}",
                    self.peer_id, e
                ));
            }
        }
        if queued > 0 {
            self.logger.debug(&format!(
                "Applied {} queued candidate(s) from {}",
                queued, self.peer_id
            ));
        }
        Ok(())
    }

    fn signal(&self, message: Message) -> Result<(), PeerError> {
        self.signaling
            .send(message)
            .map_err(|e| PeerError::Negotiation(format!("relay unreachable: {}", e)))
    }

    pub fn open_data_channel(&self, label: &str) -> Result<Arc<dyn DataChannel>, PeerError> {
        let channel = self.connection.create_data_channel(label)?;
        self.attach_data_channel(Arc::clone(&channel));
        Ok(channel)
    }

    /// Adopts a channel announced by the remote side.
    pub fn attach_data_channel(&self, channel: Arc<dyn DataChannel>) {
        if let Ok(mut slot) = self.data_channel.lock() {
            *slot = Some(channel);
        }
    }

    pub fn data_channel(&self) -> Option<Arc<dyn DataChannel>> {
        self.data_channel.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn channel_is_open(&self) -> bool {
        self.data_channel().is_some_and(|channel| channel.is_open())
    }

    pub fn add_local_stream(&self, stream: &MediaStream) -> Result<(), PeerError> {
        for track in stream.tracks() {
            self.connection.add_track(Arc::clone(track))?;
        }
        Ok(())
    }

    pub fn remove_local_tracks(&self) {
        self.connection.remove_tracks();
    }

    /// Closes the data channel and the connection, detaching local tracks.
    /// Stopping the capture itself is the owner's business: a room shares one
    /// capture across all of its connections.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(channel) = self.data_channel.lock().ok().and_then(|mut slot| slot.take()) {
            channel.close();
        }
        self.connection.remove_tracks();
        self.connection.close();
        self.logger
            .debug(&format!("Connection to {} closed", self.peer_id));
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn lock_ice(&self) -> MutexGuard<'_, IceState> {
        match self.ice.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
