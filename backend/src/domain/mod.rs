//! Domain layer - relay-side models

mod connection;
mod relay_verb;
mod room;

pub use connection::ConnectionId;
pub use relay_verb::{RelayVerb, Scope};
pub use room::Room;
pub use signaling_protocol::{ChannelId, ParticipantId};
