//! One-to-one sessions: request, accept, negotiate, talk, end.
//!
//! Each remote participant has at most one session record. A new request in
//! either direction replaces the record; only the message log survives.

mod event;
mod log;
mod manager;
mod record;
mod status;

pub use event::SessionEvent;
pub use log::{LogEntry, MessageLog};
pub use manager::{DM_CHANNEL_LABEL, DirectSessionManager};
pub use record::SessionSnapshot;
pub use status::{InvalidTransition, SessionStatus};
