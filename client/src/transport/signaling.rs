use signaling_protocol::Message;

use crate::error::Result;

/// Outbound half of the relay link.
pub trait SignalingSink: Send + Sync {
    fn send(&self, message: Message) -> Result<()>;
}
