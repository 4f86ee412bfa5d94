//! Full-mesh voice rooms: one peer connection per other member.
//!
//! For every pair of members the one with the lexicographically smaller id
//! makes the offer, whichever of the two joined first. The newcomer learns
//! about existing members from the roster and they learn about it from the
//! join announcement; both sides apply the same rule, so a pair never
//! double-offers.

mod event;
mod manager;
mod status;

pub use event::MeshEvent;
pub use manager::{ParticipantView, RoomSnapshot, VoiceMeshManager, offers_to};
pub use status::{LinkStatus, RoomStatus};
