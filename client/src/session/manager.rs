use std::collections::HashMap;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use signaling_protocol::{CandidateInit, Message, OpaquePayload, ParticipantId, PeerMsg};

use super::record::Session;
use super::{LogEntry, SessionEvent, SessionSnapshot, SessionStatus};
use crate::config::{SessionConfig, TransferConfig};
use crate::context::ClientContext;
use crate::error::{ClientError, PeerError, Result};
use crate::inbound::LinkId;
use crate::peer::{NegotiationOutcome, PeerConnectionAdapter, Role, SignalScope};
use crate::transfer::{FileSender, Received, WireMessage, new_message_id, now_millis};
use crate::transport::{ConnectionState, MediaConstraints, PeerEvent};

/// Label of the data channel the offerer opens for chat and files.
pub const DM_CHANNEL_LABEL: &str = "dm";

type SessionRef = Arc<Mutex<Session>>;

fn lock(session: &SessionRef) -> MutexGuard<'_, Session> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Drives every one-to-one session of the local participant.
///
/// The session map lock is only held to find or replace a record; all work
/// on a session happens under that session's own lock.
pub struct DirectSessionManager {
    ctx: ClientContext,
    sessions: Mutex<HashMap<ParticipantId, SessionRef>>,
    events: Sender<SessionEvent>,
    file_sender: FileSender,
    negotiation_timeout: Duration,
    stale_transfer_age: Duration,
    logger: logging::Logger,
}

impl DirectSessionManager {
    pub fn new(
        ctx: ClientContext,
        session_config: &SessionConfig,
        transfer_config: &TransferConfig,
        events: Sender<SessionEvent>,
    ) -> Self {
        let logger = ctx.logger.for_component("Sessions");
        let file_sender = FileSender::new(
            transfer_config.chunk_size,
            transfer_config.max_buffered_amount,
            ctx.logger.for_component("Transfer"),
        );

        DirectSessionManager {
            ctx,
            sessions: Mutex::new(HashMap::new()),
            events,
            file_sender,
            negotiation_timeout: session_config.negotiation_timeout(),
            stale_transfer_age: transfer_config.stale_transfer_age(),
            logger,
        }
    }

    pub fn local_id(&self) -> &str {
        &self.ctx.local_id
    }

    // ---- queries ----

    pub fn status(&self, peer_id: &str) -> Option<SessionStatus> {
        self.session(peer_id).map(|session| lock(&session).status())
    }

    pub fn snapshot(&self, peer_id: &str) -> Option<SessionSnapshot> {
        self.session(peer_id).map(|session| lock(&session).snapshot())
    }

    pub fn peers(&self) -> Vec<ParticipantId> {
        let mut peers: Vec<_> = self.all_sessions().into_iter().map(|(id, _)| id).collect();
        peers.sort();
        peers
    }

    /// Asks the relay whether `peer_id` is connected; the answer arrives as
    /// a [`SessionEvent::Presence`].
    pub fn query_presence(&self, peer_id: &str) -> Result<()> {
        self.ctx
            .signaling
            .send(Message::IsOnline(PeerMsg::new(peer_id)))
    }

    // ---- local commands ----

    pub fn request_session(&self, peer_id: &str) -> Result<()> {
        if peer_id == self.ctx.local_id {
            return Err(ClientError::SelfTarget);
        }
        if let Some(existing) = self.session(peer_id) {
            let status = lock(&existing).status();
            if !status.is_replaceable() {
                return Err(self.invalid_state(peer_id, status, "request a new session"));
            }
        }

        let session = self.fresh_session(peer_id);
        let mut s = lock(&session);
        self.set_status(&mut s, SessionStatus::Requesting);

        if let Err(e) = self
            .ctx
            .signaling
            .send(Message::RequestSession(PeerMsg::new(peer_id)))
        {
            self.fail(&mut s, &format!("relay unreachable: {}", e));
        }
        Ok(())
    }

    pub fn accept_session(&self, peer_id: &str) -> Result<()> {
        let session = self.require(peer_id)?;
        let mut s = lock(&session);
        if s.status() != SessionStatus::Incoming {
            return Err(self.invalid_state(peer_id, s.status(), "accept"));
        }

        match self.ctx.connect(peer_id, SignalScope::Direct, Role::Answerer) {
            Ok(adapter) => {
                s.is_offerer = false;
                s.adapter = Some(adapter);
            }
            Err(e) => {
                self.fail(&mut s, &format!("could not create peer connection: {}", e));
                return Ok(());
            }
        }
        self.set_status(&mut s, SessionStatus::Connecting);

        if let Err(e) = self
            .ctx
            .signaling
            .send(Message::AcceptSession(PeerMsg::new(peer_id)))
        {
            self.fail(&mut s, &format!("relay unreachable: {}", e));
        }
        Ok(())
    }

    pub fn reject_session(&self, peer_id: &str) -> Result<()> {
        let session = self.require(peer_id)?;
        let mut s = lock(&session);
        if s.status() != SessionStatus::Incoming {
            return Err(self.invalid_state(peer_id, s.status(), "reject"));
        }

        self.set_status(&mut s, SessionStatus::Failed);
        if let Err(e) = self
            .ctx
            .signaling
            .send(Message::RejectSession(PeerMsg::new(peer_id)))
        {
            self.logger
                .warn(&format!("Could not tell {} about the rejection: {}", peer_id, e));
        }
        Ok(())
    }

    /// Ends the session from this side. An active session ends; one that
    /// never got going fails.
    pub fn end_session(&self, peer_id: &str) -> Result<()> {
        let session = self.require(peer_id)?;
        let mut s = lock(&session);
        let next = match s.status() {
            SessionStatus::Active => SessionStatus::Ended,
            SessionStatus::Requesting | SessionStatus::Incoming | SessionStatus::Connecting => {
                SessionStatus::Failed
            }
            SessionStatus::Idle | SessionStatus::Ended | SessionStatus::Failed => return Ok(()),
        };

        if let Err(e) = self
            .ctx
            .signaling
            .send(Message::EndSession(PeerMsg::new(peer_id)))
        {
            self.logger
                .warn(&format!("Could not tell {} the session ended: {}", peer_id, e));
        }
        self.teardown(&mut s);
        self.set_status(&mut s, next);
        Ok(())
    }

    /// Ends every session that is not already over.
    pub fn end_all(&self) {
        for (peer_id, _) in self.all_sessions() {
            if let Err(e) = self.end_session(&peer_id) {
                self.logger
                    .warn(&format!("Ending session with {} failed: {}", peer_id, e));
            }
        }
    }

    pub fn send_text(&self, peer_id: &str, content: &str) -> Result<LogEntry> {
        let session = self.require(peer_id)?;
        let mut s = lock(&session);
        let channel = s
            .open_channel()
            .ok_or_else(|| ClientError::ChannelNotOpen(peer_id.to_string()))?;

        let id = new_message_id();
        let timestamp = now_millis();
        let message = WireMessage::Text {
            id: id.clone(),
            sender_id: self.ctx.local_id.clone(),
            ts: timestamp,
            content: content.to_string(),
        };
        channel.send_text(&message.encode()?)?;

        let entry = LogEntry::Text {
            id,
            sender_id: self.ctx.local_id.clone(),
            timestamp,
            content: content.to_string(),
        };
        self.append(&mut s, entry.clone());
        Ok(entry)
    }

    /// Streams a file to the peer. Blocks until every chunk has been handed
    /// to the data channel, so callers should not run it on the logic thread.
    pub fn send_file(
        &self,
        peer_id: &str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<LogEntry> {
        let session = self.require(peer_id)?;
        // The session lock is not held while chunks wait for buffer space.
        let channel = lock(&session)
            .open_channel()
            .ok_or_else(|| ClientError::ChannelNotOpen(peer_id.to_string()))?;

        let file = self.file_sender.send(
            channel.as_ref(),
            &self.ctx.local_id,
            file_name,
            mime_type,
            bytes,
        )?;

        let entry = LogEntry::File {
            id: file.id,
            sender_id: self.ctx.local_id.clone(),
            timestamp: file.timestamp,
            file_name: file.file_name,
            file_size: file.file_size,
            mime_type: file.mime_type,
            data: bytes.to_vec(),
        };
        self.append(&mut lock(&session), entry.clone());
        Ok(entry)
    }

    /// Adds local audio (and video) to an active session.
    ///
    /// Only the offerer renegotiates; on the answering side the tracks are
    /// attached and flow once the offerer next renegotiates.
    pub fn start_call(&self, peer_id: &str, with_video: bool) -> Result<()> {
        let session = self.require(peer_id)?;
        let mut s = lock(&session);
        let adapter = match (&s.adapter, s.status()) {
            (Some(adapter), SessionStatus::Active) => Arc::clone(adapter),
            (_, status) => return Err(self.invalid_state(peer_id, status, "start a call")),
        };
        let kind = if with_video { "video" } else { "voice" };

        let stream = match self.ctx.capture.acquire(MediaConstraints::with_video(with_video)) {
            Ok(stream) => stream,
            Err(e) => {
                self.append(
                    &mut s,
                    LogEntry::system(format!("Failed to start {} call: {}", kind, e)),
                );
                return Err(e.into());
            }
        };

        if s.local_stream.take().is_some() {
            adapter.remove_local_tracks();
        }
        if let Err(e) = adapter.add_local_stream(&stream) {
            self.ctx.capture.release(&stream);
            self.append(
                &mut s,
                LogEntry::system(format!("Failed to start {} call: {}", kind, e)),
            );
            return Err(e.into());
        }
        s.local_stream = Some(stream);
        self.emit(SessionEvent::CallStarted {
            peer_id: peer_id.to_string(),
            with_video,
        });

        self.renegotiate(&mut s, &adapter);
        Ok(())
    }

    pub fn stop_call(&self, peer_id: &str) -> Result<()> {
        let session = self.require(peer_id)?;
        let mut s = lock(&session);
        let Some(stream) = s.local_stream.take() else {
            return Ok(());
        };

        self.ctx.capture.release(&stream);
        if let Some(adapter) = s.adapter.clone() {
            adapter.remove_local_tracks();
            self.renegotiate(&mut s, &adapter);
        }
        self.emit(SessionEvent::CallStopped {
            peer_id: peer_id.to_string(),
        });
        Ok(())
    }

    // ---- housekeeping ----

    /// Fails sessions stuck in `requesting` or `connecting` for longer than
    /// the negotiation timeout. Returns the affected peers.
    pub fn expire_stale(&self, now: Instant) -> Vec<ParticipantId> {
        let mut expired = Vec::new();
        for (peer_id, session) in self.all_sessions() {
            let mut s = lock(&session);
            let waiting = matches!(
                s.status(),
                SessionStatus::Requesting | SessionStatus::Connecting
            );
            if waiting && now.saturating_duration_since(s.status_since()) >= self.negotiation_timeout
            {
                self.append(&mut s, LogEntry::system("Connection attempt timed out"));
                self.fail(&mut s, "negotiation timed out");
                expired.push(peer_id);
            }
        }
        expired
    }

    /// Discards inbound file transfers that stopped making progress.
    pub fn prune_stale_transfers(&self, now: Instant) -> usize {
        let mut pruned = 0;
        for (peer_id, session) in self.all_sessions() {
            let stale = lock(&session)
                .reassembler
                .prune_stale(self.stale_transfer_age, now);
            for id in &stale {
                self.logger
                    .warn(&format!("Dropping incomplete transfer {} from {}", id, peer_id));
            }
            pruned += stale.len();
        }
        pruned
    }

    // ---- relay input ----

    pub fn handle_signal(&self, message: Message) {
        match message {
            Message::SessionRequested(m) => self.on_session_requested(&m.peer_id),
            Message::SessionAccepted(m) => self.on_session_accepted(&m.peer_id),
            Message::SessionRejected(m) => {
                self.on_request_refused(&m.peer_id, "Session request declined")
            }
            Message::PeerUnavailable(m) => self.on_request_refused(&m.peer_id, "Peer unavailable"),
            Message::SessionEnded(m) => self.on_remote_end(&m.peer_id, "ended the session"),
            Message::PeerDisconnected(m) => self.on_remote_end(&m.peer_id, "disconnected"),
            Message::OfferReceived(m) => self.on_offer(&m.peer_id, m.sdp),
            Message::AnswerReceived(m) => self.on_answer(&m.peer_id, m.sdp),
            Message::IceCandidateReceived(m) => self.on_remote_candidate(&m.peer_id, m.candidate),
            Message::OnlineStatus(m) => self.emit(SessionEvent::Presence {
                peer_id: m.peer_id,
                online: m.online,
            }),
            other => self
                .logger
                .debug(&format!("Ignoring {} in session manager", other.label())),
        }
    }

    fn on_session_requested(&self, peer_id: &str) {
        if peer_id == self.ctx.local_id {
            self.logger.warn("Ignoring session request from ourselves");
            return;
        }

        let session = self.fresh_session(peer_id);
        let mut s = lock(&session);
        if self.set_status(&mut s, SessionStatus::Incoming) {
            self.emit(SessionEvent::IncomingRequest {
                peer: s.peer.clone(),
            });
        }
    }

    fn on_session_accepted(&self, peer_id: &str) {
        let Some(session) = self.session(peer_id) else {
            self.logger
                .warn(&format!("Acceptance from {} without a request", peer_id));
            return;
        };
        let mut s = lock(&session);
        if s.status() != SessionStatus::Requesting {
            self.logger.warn(&format!(
                "Ignoring acceptance from {} while {}",
                peer_id,
                s.status()
            ));
            return;
        }

        let adapter = match self.ctx.connect(peer_id, SignalScope::Direct, Role::Offerer) {
            Ok(adapter) => adapter,
            Err(e) => {
                self.fail(&mut s, &format!("could not create peer connection: {}", e));
                return;
            }
        };
        s.is_offerer = true;
        s.adapter = Some(Arc::clone(&adapter));
        self.set_status(&mut s, SessionStatus::Connecting);

        let started = adapter
            .open_data_channel(DM_CHANNEL_LABEL)
            .and_then(|_| adapter.negotiate());
        if let Err(e) = started {
            self.fail(&mut s, &format!("negotiation failed: {}", e));
        }
    }

    fn on_request_refused(&self, peer_id: &str, notice: &str) {
        let Some(session) = self.session(peer_id) else {
            return;
        };
        let mut s = lock(&session);
        if s.status() != SessionStatus::Requesting {
            self.logger.debug(&format!(
                "Ignoring refusal from {} while {}",
                peer_id,
                s.status()
            ));
            return;
        }
        self.append(&mut s, LogEntry::system(notice));
        self.fail(&mut s, notice);
    }

    fn on_remote_end(&self, peer_id: &str, what: &str) {
        let Some(session) = self.session(peer_id) else {
            return;
        };
        let mut s = lock(&session);
        let next = match s.status() {
            SessionStatus::Active => SessionStatus::Ended,
            SessionStatus::Requesting | SessionStatus::Incoming | SessionStatus::Connecting => {
                SessionStatus::Failed
            }
            SessionStatus::Idle | SessionStatus::Ended | SessionStatus::Failed => return,
        };

        self.logger.info(&format!("{} {}", peer_id, what));
        self.teardown(&mut s);
        self.set_status(&mut s, next);
    }

    fn on_offer(&self, peer_id: &str, sdp: OpaquePayload) {
        let Some((session, adapter)) = self.with_adapter(peer_id, "offer") else {
            return;
        };
        let mut s = lock(&session);
        match adapter.handle_remote_offer(sdp) {
            Ok(()) => {}
            Err(PeerError::UnexpectedDescription(what)) => self.logger.warn(&format!(
                "Ignoring {} from {}: we are the offerer",
                what, peer_id
            )),
            Err(e) => self.negotiation_failed(&mut s, e),
        }
    }

    fn on_answer(&self, peer_id: &str, sdp: OpaquePayload) {
        let Some((session, adapter)) = self.with_adapter(peer_id, "answer") else {
            return;
        };
        let mut s = lock(&session);
        match adapter.handle_remote_answer(sdp) {
            Ok(()) => {}
            Err(PeerError::UnexpectedDescription(what)) => self.logger.warn(&format!(
                "Ignoring unsolicited {} from {}",
                what, peer_id
            )),
            Err(e) => self.negotiation_failed(&mut s, e),
        }
    }

    fn on_remote_candidate(&self, peer_id: &str, candidate: CandidateInit) {
        let Some((_, adapter)) = self.with_adapter(peer_id, "ICE candidate") else {
            return;
        };
        if let Err(e) = adapter.handle_remote_candidate(candidate) {
            self.logger
                .warn(&format!("Candidate from {} rejected: {}", peer_id, e));
        }
    }

    // ---- peer connection callbacks ----

    pub fn handle_peer_event(&self, peer_id: &str, link_id: LinkId, event: PeerEvent) {
        let Some(session) = self.session(peer_id) else {
            self.logger
                .debug(&format!("Dropping {:?} for unknown peer {}", event, peer_id));
            return;
        };
        let mut s = lock(&session);
        let adapter = match &s.adapter {
            Some(adapter) if adapter.link_id() == link_id => Arc::clone(adapter),
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
            PeerEvent::ConnectionState(state) if state.is_failure() => {
                self.on_transport_lost(&mut s, state)
            }
            PeerEvent::ConnectionState(state) => self
                .logger
                .debug(&format!("Connection to {} is {:?}", peer_id, state)),
            PeerEvent::DataChannel(channel) => {
                self.logger.debug(&format!(
                    "{} opened data channel '{}'",
                    peer_id,
                    channel.label()
                ));
                adapter.attach_data_channel(channel);
            }
            PeerEvent::ChannelOpen => {
                if s.status() == SessionStatus::Connecting {
                    self.set_status(&mut s, SessionStatus::Active);
                }
            }
            PeerEvent::ChannelClosed => match s.status() {
                SessionStatus::Connecting => self.fail(&mut s, "data channel closed"),
                SessionStatus::Active => {
                    self.teardown(&mut s);
                    self.set_status(&mut s, SessionStatus::Ended);
                }
                _ => {}
            },
            PeerEvent::ChannelMessage(text) => self.on_channel_message(&mut s, &text),
            PeerEvent::RemoteTrack(track) => {
                if !s.remote_tracks.contains(&track) {
                    s.remote_tracks.push(track.clone());
                    self.emit(SessionEvent::RemoteTrackAdded {
                        peer_id: peer_id.to_string(),
                        track,
                    });
                }
            }
            PeerEvent::NegotiationNeeded => {
                if s.status() == SessionStatus::Active {
                    self.renegotiate(&mut s, &adapter);
                }
            }
        }
    }

    fn on_transport_lost(&self, s: &mut Session, state: ConnectionState) {
        match s.status() {
            SessionStatus::Connecting => self.fail(s, &format!("connection {:?}", state)),
            SessionStatus::Active => {
                self.logger
                    .warn(&format!("Connection to {} lost ({:?})", s.peer.id, state));
                self.teardown(s);
                self.set_status(s, SessionStatus::Ended);
            }
            _ => {}
        }
    }

    fn on_channel_message(&self, s: &mut Session, text: &str) {
        let message = match WireMessage::decode(text) {
            Ok(message) => message,
            Err(e) => {
                self.logger
                    .warn(&format!("Unreadable message from {}: {}", s.peer.id, e));
                return;
            }
        };

        match s.reassembler.accept(message, Instant::now()) {
            Ok(Some(Received::Text(text))) => self.append(
                s,
                LogEntry::Text {
                    id: text.id,
                    sender_id: text.sender_id,
                    timestamp: text.timestamp,
                    content: text.content,
                },
            ),
            Ok(Some(Received::File(file))) => {
                self.logger.info(&format!(
                    "Received {} ({} bytes) from {}",
                    file.file_name, file.file_size, s.peer.id
                ));
                self.append(
                    s,
                    LogEntry::File {
                        id: file.id,
                        sender_id: file.sender_id,
                        timestamp: file.timestamp,
                        file_name: file.file_name,
                        file_size: file.file_size,
                        mime_type: file.mime_type,
                        data: file.data,
                    },
                );
            }
            Ok(None) => {}
            Err(e) => self
                .logger
                .warn(&format!("Discarding data from {}: {}", s.peer.id, e)),
        }
    }

    // ---- helpers ----

    fn session(&self, peer_id: &str) -> Option<SessionRef> {
        match self.sessions.lock() {
            Ok(sessions) => sessions.get(peer_id).cloned(),
            Err(poisoned) => poisoned.into_inner().get(peer_id).cloned(),
        }
    }

    fn require(&self, peer_id: &str) -> Result<SessionRef> {
        self.session(peer_id)
            .ok_or_else(|| ClientError::UnknownPeer(peer_id.to_string()))
    }

    fn all_sessions(&self) -> Vec<(ParticipantId, SessionRef)> {
        let sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };
        sessions
            .iter()
            .map(|(id, session)| (id.clone(), Arc::clone(session)))
            .collect()
    }

    fn with_adapter(
        &self,
        peer_id: &str,
        what: &str,
    ) -> Option<(SessionRef, Arc<PeerConnectionAdapter>)> {
        let session = self.session(peer_id)?;
        let adapter = lock(&session).adapter.clone();
        match adapter {
            Some(adapter) => Some((session, adapter)),
            None => {
                self.logger.warn(&format!(
                    "Dropping {} from {}: no connection in progress",
                    what, peer_id
                ));
                None
            }
        }
    }

    /// Replaces the record for `peer_id`, carrying the message log over.
    fn fresh_session(&self, peer_id: &str) -> SessionRef {
        let profile = self.ctx.profile(peer_id, &self.logger);
        let mut sessions = match self.sessions.lock() {
            Ok(sessions) => sessions,
            Err(poisoned) => poisoned.into_inner(),
        };

        let log = match sessions.remove(peer_id) {
            Some(previous) => {
                let mut previous = lock(&previous);
                self.teardown(&mut previous);
                std::mem::take(&mut previous.log)
            }
            None => Default::default(),
        };

        let session = Arc::new(Mutex::new(Session::new(profile, log)));
        sessions.insert(peer_id.to_string(), Arc::clone(&session));
        session
    }

    fn set_status(&self, s: &mut Session, next: SessionStatus) -> bool {
        match s.transition(next) {
            Ok(previous) => {
                self.logger.info(&format!(
                    "Session with {}: {} -> {}",
                    s.peer.id, previous, next
                ));
                self.emit(SessionEvent::StatusChanged {
                    peer_id: s.peer.id.clone(),
                    status: next,
                });
                true
            }
            Err(e) => {
                self.logger
                    .warn(&format!("Session with {}: {}", s.peer.id, e));
                false
            }
        }
    }

    fn fail(&self, s: &mut Session, reason: &str) {
        self.logger
            .warn(&format!("Session with {} failed: {}", s.peer.id, reason));
        self.teardown(s);
        self.set_status(s, SessionStatus::Failed);
    }

    fn negotiation_failed(&self, s: &mut Session, error: PeerError) {
        if s.status() == SessionStatus::Active {
            // Already talking: keep the session, report the failed renegotiation.
            self.append(s, LogEntry::system(format!("Call setup failed: {}", error)));
        } else {
            self.fail(s, &format!("negotiation failed: {}", error));
        }
    }

    fn renegotiate(&self, s: &mut Session, adapter: &PeerConnectionAdapter) {
        match adapter.negotiate() {
            Ok(NegotiationOutcome::NotOfferer) => self.logger.info(&format!(
                "Media changed; waiting for {} to renegotiate",
                s.peer.id
            )),
            Ok(_) => {}
            Err(e) => self.negotiation_failed(s, e),
        }
    }

    fn teardown(&self, s: &mut Session) {
        if let Some(adapter) = s.adapter.take() {
            adapter.close();
        }
        if let Some(stream) = s.local_stream.take() {
            self.ctx.capture.release(&stream);
        }
        s.remote_tracks.clear();
        s.reassembler.clear();
    }

    fn append(&self, s: &mut Session, entry: LogEntry) {
        if s.log.push(entry.clone()) {
            self.emit(SessionEvent::MessageAdded {
                peer_id: s.peer.id.clone(),
                entry,
            });
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine.
        let _ = self.events.send(event);
    }

    fn invalid_state(&self, peer_id: &str, status: SessionStatus, action: &'static str) -> ClientError {
        ClientError::InvalidState {
            peer: peer_id.to_string(),
            status: status.to_string(),
            action,
        }
    }
}
