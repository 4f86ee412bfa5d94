//! Seams to everything outside the client's control: the relay link, the
//! platform WebRTC stack, capture devices and the profile directory.
//!
//! Production code plugs real implementations in; `crate::testing` provides
//! in-process ones.

mod channel;
mod connection;
mod directory;
mod media;
mod signaling;

pub use channel::{DataChannel, LOW_BUFFER_POLL};
pub use connection::{
    ConnectionState, PeerConnection, PeerConnectionFactory, PeerEvent, PeerEventHandler,
    RemoteTrack, SdpKind, SessionDescription,
};
pub use directory::{Directory, Profile, StaticDirectory};
pub use media::{
    ExclusiveCapture, MediaConstraints, MediaDevices, MediaStream, MediaTrack, TrackKind,
};
pub use signaling::SignalingSink;
