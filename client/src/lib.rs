//! PeerLink client
//!
//! Direct one-to-one sessions with chat, file transfer and calls, plus
//! full-mesh voice rooms. The relay only carries signaling; everything else
//! flows over peer connections supplied by the embedding platform.

pub mod client;
pub mod config;
pub mod context;
pub mod error;
pub mod inbound;
pub mod mesh;
pub mod peer;
pub mod relay_client;
pub mod router;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod transfer;
pub mod transport;

pub use client::{Client, Platform};
pub use config::ClientConfig;
pub use error::{ClientError, MediaError, PeerError, Result, TransferError};
pub use mesh::{MeshEvent, RoomStatus, VoiceMeshManager};
pub use peer::{PeerConnectionAdapter, Role, SignalScope};
pub use session::{DirectSessionManager, LogEntry, SessionEvent, SessionStatus};
