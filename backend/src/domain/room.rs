use std::collections::BTreeSet;

use super::{ChannelId, ParticipantId};

/// Members currently joined to one voice channel.
#[derive(Debug, Clone)]
pub struct Room {
    pub channel_id: ChannelId,
    members: BTreeSet<ParticipantId>,
}

impl Room {
    pub fn new(channel_id: ChannelId) -> Self {
        Room {
            channel_id,
            members: BTreeSet::new(),
        }
    }

    /// Returns false if the participant was already a member.
    pub fn join(&mut self, participant: &ParticipantId) -> bool {
        self.members.insert(participant.clone())
    }

    pub fn leave(&mut self, participant: &ParticipantId) -> bool {
        self.members.remove(participant)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.members.contains(participant)
    }

    /// Sorted member list without `participant`.
    pub fn members_except(&self, participant: &ParticipantId) -> Vec<ParticipantId> {
        self.members
            .iter()
            .filter(|m| *m != participant)
            .cloned()
            .collect()
    }

    pub fn members(&self) -> Vec<ParticipantId> {
        self.members.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_is_idempotent() {
        let mut room = Room::new("lobby".into());
        assert!(room.join(&"alice".into()));
        assert!(!room.join(&"alice".into()));
        assert_eq!(room.len(), 1);
    }

    #[test]
    fn test_members_except_is_sorted() {
        let mut room = Room::new("lobby".into());
        for id in ["carol", "alice", "bob"] {
            room.join(&id.to_string());
        }
        assert_eq!(room.members_except(&"bob".into()), vec!["alice", "carol"]);
    }
}
