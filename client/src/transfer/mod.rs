//! Text and file exchange over an ordered data channel.
//!
//! Every data channel message is one JSON object tagged by `t`:
//!
//! - `text`: a chat line
//! - `file-meta`: announces a file and how many chunks will follow
//! - `file-chunk`: one base64 slice of the file, by index
//!
//! Files travel as 16 KiB slices, sent in index order only while the
//! channel's buffered amount is below 64 KiB. Nothing is retransmitted: a
//! transfer interrupted by a closing channel simply never completes.

mod incoming;
mod message;
mod outgoing;

pub use incoming::{Reassembler, Received, ReceivedFile, ReceivedText};
pub use message::{WireMessage, new_message_id, now_millis};
pub use outgoing::{CHUNK_SIZE, FileSender, MAX_BUFFERED_AMOUNT, OutgoingFile};
