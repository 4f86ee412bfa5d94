use serde::Deserialize;
use std::time::Duration;

use crate::transfer::{CHUNK_SIZE, MAX_BUFFERED_AMOUNT};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub chunk_size: usize,
    pub max_buffered_amount: usize,
    /// Incomplete inbound transfers older than this are discarded.
    pub stale_transfer_secs: u64,
}

impl Default for TransferConfig {
    fn default() -> Self {
        TransferConfig {
            chunk_size: CHUNK_SIZE,
            max_buffered_amount: MAX_BUFFERED_AMOUNT,
            stale_transfer_secs: 300,
        }
    }
}

impl TransferConfig {
    pub fn stale_transfer_age(&self) -> Duration {
        Duration::from_secs(self.stale_transfer_secs)
    }
}
