//! Voice room membership and join/leave fan-out.

use signaling_protocol::{Message, RoomMemberMsg, RoomRosterMsg};

use crate::domain::{ChannelId, ParticipantId};
use crate::infrastructure::Registry;
use crate::infrastructure::registry::RoomDeparture;

#[derive(Clone)]
pub struct RoomUseCase {
    registry: Registry,
    logger: logging::Logger,
}

impl RoomUseCase {
    pub fn new(registry: Registry, logger: logging::Logger) -> Self {
        RoomUseCase { registry, logger }
    }

    /// Joins the room, announces the newcomer to the existing members and
    /// returns the roster of those members to the caller.
    pub fn join_room(&self, participant: &ParticipantId, channel_id: &ChannelId) -> Option<Message> {
        let existing = match self.registry.join_room(channel_id, participant) {
            Ok(existing) => existing,
            Err(e) => {
                self.logger.error(&format!("Join of {} failed: {}", channel_id, e));
                return None;
            }
        };

        let joined = Message::RoomUserJoined(RoomMemberMsg {
            channel_id: channel_id.clone(),
            participant_id: participant.clone(),
        });
        for member in &existing {
            let _ = self.registry.forward(member, joined.clone());
        }

        self.logger.info(&format!(
            "{} joined room {} ({} already present)",
            participant,
            channel_id,
            existing.len()
        ));

        Some(Message::RoomRoster(RoomRosterMsg {
            channel_id: channel_id.clone(),
            participants: existing,
        }))
    }

    pub fn leave_room(&self, participant: &ParticipantId, channel_id: &ChannelId) -> Option<Message> {
        match self.registry.leave_room(channel_id, participant) {
            Ok(Some(departure)) => self.announce_departure(participant, &departure),
            Ok(None) => self.logger.debug(&format!(
                "{} left room {} without being a member",
                participant, channel_id
            )),
            Err(e) => self.logger.error(&format!("Leave of {} failed: {}", channel_id, e)),
        }
        None
    }

    /// Removes a disconnected participant from every room.
    pub fn leave_all(&self, participant: &ParticipantId) {
        match self.registry.leave_all_rooms(participant) {
            Ok(departures) => {
                for departure in &departures {
                    self.announce_departure(participant, departure);
                }
            }
            Err(e) => self.logger.error(&format!("Room cleanup failed: {}", e)),
        }
    }

    fn announce_departure(&self, participant: &ParticipantId, departure: &RoomDeparture) {
        let left = Message::RoomUserLeft(RoomMemberMsg {
            channel_id: departure.channel_id.clone(),
            participant_id: participant.clone(),
        });
        for member in &departure.remaining {
            let _ = self.registry.forward(member, left.clone());
        }

        if departure.remaining.is_empty() {
            self.logger.info(&format!(
                "{} left room {}, room closed",
                participant, departure.channel_id
            ));
        } else {
            self.logger.info(&format!(
                "{} left room {}",
                participant, departure.channel_id
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_join_announces_to_existing_members_only() {
        let registry = Registry::new();
        let rooms = RoomUseCase::new(registry.clone(), logging::Logger::disabled());
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        registry.register(&"a".into(), tx_a).unwrap();
        registry.register(&"b".into(), tx_b).unwrap();

        rooms.join_room(&"a".into(), &"lobby".into());
        let roster = rooms.join_room(&"b".into(), &"lobby".into());

        assert_eq!(
            roster,
            Some(Message::RoomRoster(RoomRosterMsg {
                channel_id: "lobby".into(),
                participants: vec!["a".into()],
            }))
        );
        assert!(matches!(rx_a.try_recv(), Ok(Message::RoomUserJoined(m)) if m.participant_id == "b"));
        assert!(rx_b.try_recv().is_err());
    }
}
