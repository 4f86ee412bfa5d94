use std::sync::Arc;
use std::time::Instant;

use super::{InvalidTransition, LogEntry, MessageLog, SessionStatus};
use crate::peer::PeerConnectionAdapter;
use crate::transfer::Reassembler;
use crate::transport::{DataChannel, MediaStream, Profile, RemoteTrack};

/// Mutable state of one session, guarded by its own lock.
pub(crate) struct Session {
    pub(crate) peer: Profile,
    status: SessionStatus,
    status_since: Instant,
    pub(crate) is_offerer: bool,
    pub(crate) adapter: Option<Arc<PeerConnectionAdapter>>,
    pub(crate) local_stream: Option<MediaStream>,
    pub(crate) remote_tracks: Vec<RemoteTrack>,
    pub(crate) reassembler: Reassembler,
    pub(crate) log: MessageLog,
}

impl Session {
    pub(crate) fn new(peer: Profile, log: MessageLog) -> Self {
        Session {
            peer,
            status: SessionStatus::Idle,
            status_since: Instant::now(),
            is_offerer: false,
            adapter: None,
            local_stream: None,
            remote_tracks: Vec::new(),
            reassembler: Reassembler::new(),
            log,
        }
    }

    pub(crate) fn status(&self) -> SessionStatus {
        self.status
    }

    pub(crate) fn status_since(&self) -> Instant {
        self.status_since
    }

    /// Applies `next` if the table allows it, returning the previous status.
    pub(crate) fn transition(
        &mut self,
        next: SessionStatus,
    ) -> Result<SessionStatus, InvalidTransition> {
        self.status.check_transition(next)?;
        let previous = self.status;
        self.status = next;
        self.status_since = Instant::now();
        Ok(previous)
    }

    /// The data channel, if the session is active and the channel open.
    pub(crate) fn open_channel(&self) -> Option<Arc<dyn DataChannel>> {
        if self.status != SessionStatus::Active {
            return None;
        }
        self.adapter
            .as_ref()
            .and_then(|adapter| adapter.data_channel())
            .filter(|channel| channel.is_open())
    }

    pub(crate) fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            peer: self.peer.clone(),
            status: self.status,
            is_offerer: self.is_offerer,
            messages: self.log.entries().to_vec(),
            remote_tracks: self.remote_tracks.clone(),
            in_call: self.local_stream.is_some(),
            pending_transfers: self.reassembler.in_progress(),
        }
    }
}

/// Read-only copy of a session for callers outside the manager.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub peer: Profile,
    pub status: SessionStatus,
    pub is_offerer: bool,
    pub messages: Vec<LogEntry>,
    pub remote_tracks: Vec<RemoteTrack>,
    pub in_call: bool,
    pub pending_transfers: usize,
}

impl SessionSnapshot {
    pub fn texts(&self) -> Vec<&str> {
        self.messages
            .iter()
            .filter_map(|entry| match entry {
                LogEntry::Text { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }
}
