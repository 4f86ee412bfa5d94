use std::collections::HashSet;

use signaling_protocol::ParticipantId;

use crate::transfer::{new_message_id, now_millis};

#[derive(Debug, Clone, PartialEq)]
pub enum LogEntry {
    Text {
        id: String,
        sender_id: ParticipantId,
        timestamp: i64,
        content: String,
    },
    File {
        id: String,
        sender_id: ParticipantId,
        timestamp: i64,
        file_name: String,
        file_size: u64,
        mime_type: String,
        data: Vec<u8>,
    },
    /// Locally generated notice, never sent to the peer.
    System {
        id: String,
        timestamp: i64,
        content: String,
    },
}

impl LogEntry {
    pub fn system(content: impl Into<String>) -> Self {
        LogEntry::System {
            id: new_message_id(),
            timestamp: now_millis(),
            content: content.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            LogEntry::Text { id, .. } | LogEntry::File { id, .. } | LogEntry::System { id, .. } => id,
        }
    }
}

/// Conversation history with one peer, in arrival order, unique by id.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    entries: Vec<LogEntry>,
    seen: HashSet<String>,
}

impl MessageLog {
    /// Appends `entry` unless one with the same id is already present.
    pub fn push(&mut self, entry: LogEntry) -> bool {
        if !self.seen.insert(entry.id().to_string()) {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
