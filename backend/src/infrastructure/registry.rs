//! In-memory relay state: live registrations and room membership.

use chrono::{DateTime, Utc};
use signaling_protocol::Message;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::domain::{ChannelId, ConnectionId, ParticipantId, Room};
use crate::error::{RelayError, Result};

struct Registration {
    connection_id: ConnectionId,
    sender: Sender<Message>,
    connected_at: DateTime<Utc>,
}

/// What `register` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Registered {
    pub connection_id: ConnectionId,
    /// The connection this registration displaced, if the participant was
    /// already connected.
    pub replaced: Option<ConnectionId>,
}

/// A departure from one room, with the members left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomDeparture {
    pub channel_id: ChannelId,
    pub remaining: Vec<ParticipantId>,
}

/// Thread-safe relay state.
///
/// Clones share the same maps. Each map has its own lock, and no method holds
/// both at once.
#[derive(Clone)]
pub struct Registry {
    connections: Arc<Mutex<HashMap<ParticipantId, Registration>>>,
    rooms: Arc<Mutex<HashMap<ChannelId, Room>>>,
    next_connection_id: Arc<AtomicU64>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(Mutex::new(HashMap::new())),
            rooms: Arc::new(Mutex::new(HashMap::new())),
            next_connection_id: Arc::new(AtomicU64::new(1)),
        }
    }

    // ===== Registrations =====

    /// Makes `sender` the live connection of `participant`, replacing any
    /// previous one. The displaced sender is dropped, which closes the old
    /// connection's queue.
    pub fn register(&self, participant: &ParticipantId, sender: Sender<Message>) -> Result<Registered> {
        let connection_id = ConnectionId(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
        let previous = self
            .connections
            .lock()
            .map_err(|_| RelayError::LockPoisoned("connections"))?
            .insert(
                participant.clone(),
                Registration {
                    connection_id,
                    sender,
                    connected_at: Utc::now(),
                },
            );

        Ok(Registered {
            connection_id,
            replaced: previous.map(|r| r.connection_id),
        })
    }

    /// Removes the registration only if it still belongs to `connection_id`.
    ///
    /// Returns how long the connection was registered, or `None` when the
    /// participant has since reconnected (or was never registered).
    pub fn deregister(
        &self,
        participant: &ParticipantId,
        connection_id: ConnectionId,
    ) -> Result<Option<chrono::TimeDelta>> {
        let mut conns = self
            .connections
            .lock()
            .map_err(|_| RelayError::LockPoisoned("connections"))?;

        match conns.get(participant) {
            Some(reg) if reg.connection_id == connection_id => {
                let connected_for = Utc::now() - reg.connected_at;
                conns.remove(participant);
                Ok(Some(connected_for))
            }
            _ => Ok(None),
        }
    }

    pub fn is_registered(&self, participant: &ParticipantId) -> bool {
        self.connections
            .lock()
            .map(|conns| conns.contains_key(participant))
            .unwrap_or(false)
    }

    pub fn connection_of(&self, participant: &ParticipantId) -> Option<ConnectionId> {
        self.connections
            .lock()
            .ok()?
            .get(participant)
            .map(|r| r.connection_id)
    }

    pub fn registered_count(&self) -> usize {
        self.connections.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Queues `message` on the target's live connection.
    pub fn forward(&self, target: &ParticipantId, message: Message) -> Result<()> {
        let conns = self
            .connections
            .lock()
            .map_err(|_| RelayError::LockPoisoned("connections"))?;

        let reg = conns
            .get(target)
            .ok_or_else(|| RelayError::PeerNotConnected(target.clone()))?;

        reg.sender
            .send(message)
            .map_err(|_| RelayError::QueueClosed(target.clone()))
    }

    /// Queues `message` on every live connection except `source`'s. Returns
    /// how many connections accepted it.
    pub fn broadcast_except(&self, source: &ParticipantId, message: &Message) -> usize {
        let Ok(conns) = self.connections.lock() else {
            return 0;
        };
        conns
            .iter()
            .filter(|(pid, _)| *pid != source)
            .filter(|(_, reg)| reg.sender.send(message.clone()).is_ok())
            .count()
    }

    // ===== Rooms =====

    /// Adds `participant` to the room, creating it if needed, and returns the
    /// members that were already there.
    pub fn join_room(&self, channel_id: &ChannelId, participant: &ParticipantId) -> Result<Vec<ParticipantId>> {
        let mut rooms = self.rooms.lock().map_err(|_| RelayError::LockPoisoned("rooms"))?;
        let room = rooms
            .entry(channel_id.clone())
            .or_insert_with(|| Room::new(channel_id.clone()));
        room.join(participant);
        Ok(room.members_except(participant))
    }

    /// Removes `participant` from one room, deleting the room if it empties.
    /// `None` if the participant was not a member.
    pub fn leave_room(&self, channel_id: &ChannelId, participant: &ParticipantId) -> Result<Option<RoomDeparture>> {
        let mut rooms = self.rooms.lock().map_err(|_| RelayError::LockPoisoned("rooms"))?;
        let Some(room) = rooms.get_mut(channel_id) else {
            return Ok(None);
        };
        if !room.leave(participant) {
            return Ok(None);
        }
        let remaining = room.members();
        if room.is_empty() {
            rooms.remove(channel_id);
        }
        Ok(Some(RoomDeparture {
            channel_id: channel_id.clone(),
            remaining,
        }))
    }

    /// Removes `participant` from every room it is in.
    pub fn leave_all_rooms(&self, participant: &ParticipantId) -> Result<Vec<RoomDeparture>> {
        let mut rooms = self.rooms.lock().map_err(|_| RelayError::LockPoisoned("rooms"))?;
        let mut departures = Vec::new();

        rooms.retain(|channel_id, room| {
            if room.leave(participant) {
                departures.push(RoomDeparture {
                    channel_id: channel_id.clone(),
                    remaining: room.members(),
                });
            }
            !room.is_empty()
        });

        departures.sort_by(|a, b| a.channel_id.cmp(&b.channel_id));
        Ok(departures)
    }

    pub fn room_members(&self, channel_id: &ChannelId) -> Option<Vec<ParticipantId>> {
        self.rooms.lock().ok()?.get(channel_id).map(Room::members)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.lock().map(|r| r.len()).unwrap_or(0)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signaling_protocol::PeerMsg;
    use std::sync::mpsc;

    fn pid(s: &str) -> ParticipantId {
        s.to_string()
    }

    #[test]
    fn test_reconnect_replaces_registration() {
        let registry = Registry::new();
        let (tx1, rx1) = mpsc::channel();
        let (tx2, rx2) = mpsc::channel();

        let first = registry.register(&pid("alice"), tx1).unwrap();
        let second = registry.register(&pid("alice"), tx2).unwrap();

        assert_eq!(second.replaced, Some(first.connection_id));
        assert_eq!(registry.registered_count(), 1);

        registry
            .forward(&pid("alice"), Message::SessionEnded(PeerMsg::new("bob")))
            .unwrap();
        assert!(rx2.try_recv().is_ok());
        // The displaced queue is closed, not fed.
        assert!(matches!(rx1.try_recv(), Err(mpsc::TryRecvError::Disconnected)));
    }

    #[test]
    fn test_stale_deregister_keeps_new_connection() {
        let registry = Registry::new();
        let (tx1, _rx1) = mpsc::channel();
        let (tx2, _rx2) = mpsc::channel();

        let old = registry.register(&pid("alice"), tx1).unwrap();
        let new = registry.register(&pid("alice"), tx2).unwrap();

        assert_eq!(registry.deregister(&pid("alice"), old.connection_id).unwrap(), None);
        assert!(registry.is_registered(&pid("alice")));

        assert!(registry.deregister(&pid("alice"), new.connection_id).unwrap().is_some());
        assert!(!registry.is_registered(&pid("alice")));
    }

    #[test]
    fn test_forward_to_unknown_target() {
        let registry = Registry::new();
        let err = registry
            .forward(&pid("nobody"), Message::Heartbeat)
            .unwrap_err();
        assert!(matches!(err, RelayError::PeerNotConnected(id) if id == "nobody"));
    }

    #[test]
    fn test_broadcast_skips_source() {
        let registry = Registry::new();
        let (tx_a, rx_a) = mpsc::channel();
        let (tx_b, rx_b) = mpsc::channel();
        registry.register(&pid("a"), tx_a).unwrap();
        registry.register(&pid("b"), tx_b).unwrap();

        let sent = registry.broadcast_except(&pid("a"), &Message::PeerDisconnected(PeerMsg::new("a")));
        assert_eq!(sent, 1);
        assert!(rx_a.try_recv().is_err());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_room_lifecycle() {
        let registry = Registry::new();
        let lobby = pid("lobby");

        assert!(registry.join_room(&lobby, &pid("a")).unwrap().is_empty());
        assert_eq!(registry.join_room(&lobby, &pid("b")).unwrap(), vec!["a"]);
        assert_eq!(registry.join_room(&lobby, &pid("c")).unwrap(), vec!["a", "b"]);

        let departure = registry.leave_room(&lobby, &pid("b")).unwrap().unwrap();
        assert_eq!(departure.remaining, vec!["a", "c"]);

        registry.leave_room(&lobby, &pid("a")).unwrap();
        registry.leave_room(&lobby, &pid("c")).unwrap();
        assert_eq!(registry.room_count(), 0);
        assert_eq!(registry.room_members(&lobby), None);
    }

    #[test]
    fn test_leave_room_when_not_member() {
        let registry = Registry::new();
        registry.join_room(&pid("lobby"), &pid("a")).unwrap();
        assert_eq!(registry.leave_room(&pid("lobby"), &pid("z")).unwrap(), None);
        assert_eq!(registry.leave_room(&pid("nowhere"), &pid("a")).unwrap(), None);
    }

    #[test]
    fn test_leave_all_rooms_deletes_emptied_rooms() {
        let registry = Registry::new();
        registry.join_room(&pid("one"), &pid("a")).unwrap();
        registry.join_room(&pid("two"), &pid("a")).unwrap();
        registry.join_room(&pid("two"), &pid("b")).unwrap();

        let departures = registry.leave_all_rooms(&pid("a")).unwrap();
        assert_eq!(departures.len(), 2);
        assert_eq!(departures[0].channel_id, "one");
        assert!(departures[0].remaining.is_empty());
        assert_eq!(departures[1].remaining, vec!["b"]);

        assert_eq!(registry.room_count(), 1);
    }
}
