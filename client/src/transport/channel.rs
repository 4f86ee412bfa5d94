use std::thread;
use std::time::Duration;

use crate::error::PeerError;

/// Polling period of the default low-buffer wait.
pub const LOW_BUFFER_POLL: Duration = Duration::from_millis(10);

/// Ordered, reliable message channel between two peers.
///
/// Open, close and inbound messages are reported through the owning
/// connection's [`PeerEvent`](super::PeerEvent) handler, not by the channel
/// itself.
pub trait DataChannel: Send + Sync {
    fn label(&self) -> &str;

    fn send_text(&self, text: &str) -> Result<(), PeerError>;

    /// Bytes handed to the channel but not yet put on the wire.
    fn buffered_amount(&self) -> usize;

    fn is_open(&self) -> bool;

    fn close(&self);

    /// Blocks until the buffered amount is strictly below `threshold`.
    ///
    /// Returns false if the channel stops being open first. Transports with a
    /// native low-buffer notification should override the polling default.
    fn wait_buffered_below(&self, threshold: usize) -> bool {
        loop {
            if !self.is_open() {
                return false;
            }
            if self.buffered_amount() < threshold {
                return true;
            }
            thread::sleep(LOW_BUFFER_POLL);
        }
    }
}
