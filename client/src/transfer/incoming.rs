use std::collections::HashMap;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::message::WireMessage;
use super::outgoing::CHUNK_SIZE;
use crate::error::TransferError;

/// Upper bound on announced chunks, so a hostile meta cannot make us
/// allocate an absurd slot table.
const MAX_TRANSFER_CHUNKS: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedText {
    pub id: String,
    pub sender_id: String,
    pub timestamp: i64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedFile {
    pub id: String,
    pub sender_id: String,
    pub timestamp: i64,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Received {
    Text(ReceivedText),
    File(ReceivedFile),
}

struct IncomingTransfer {
    sender_id: String,
    timestamp: i64,
    file_name: String,
    file_size: u64,
    mime_type: String,
    slots: Vec<Option<String>>,
    filled: usize,
    started_at: Instant,
}

impl IncomingTransfer {
    fn is_complete(&self) -> bool {
        self.filled == self.slots.len()
    }

    fn assemble(self, id: String) -> Result<ReceivedFile, TransferError> {
        let mut pieces = Vec::with_capacity(self.slots.len());
        for (index, slot) in self.slots.into_iter().enumerate() {
            let encoded = slot.unwrap_or_default();
            let decoded = STANDARD
                .decode(encoded.as_bytes())
                .map_err(|_| TransferError::InvalidChunk {
                    id: id.clone(),
                    index,
                })?;
            pieces.push(decoded);
        }
        let data = pieces.concat();

        Ok(ReceivedFile {
            id,
            sender_id: self.sender_id,
            timestamp: self.timestamp,
            file_name: self.file_name,
            file_size: self.file_size,
            mime_type: self.mime_type,
            data,
        })
    }
}

/// Receiver side: one descriptor per announced file, keyed by transfer id.
#[derive(Default)]
pub struct Reassembler {
    transfers: HashMap<String, IncomingTransfer>,
}

impl Reassembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one decoded data channel message.
    ///
    /// Returns the finished item when the message completes one. Chunks for
    /// unknown transfers or outside the announced range are ignored.
    pub fn accept(
        &mut self,
        message: WireMessage,
        now: Instant,
    ) -> Result<Option<Received>, TransferError> {
        match message {
            WireMessage::Text {
                id,
                sender_id,
                ts,
                content,
            } => Ok(Some(Received::Text(ReceivedText {
                id,
                sender_id,
                timestamp: ts,
                content,
            }))),

            WireMessage::FileMeta {
                id,
                sender_id,
                ts,
                file_name,
                file_size,
                mime_type,
                total_chunks,
            } => {
                // A repeated meta must not wipe chunks already received.
                if self.transfers.contains_key(&id) {
                    return Ok(None);
                }
                if total_chunks > MAX_TRANSFER_CHUNKS
                    || (total_chunks as u64) > file_size
                    || (file_size > 0 && total_chunks == 0)
                    || file_size > total_chunks as u64 * CHUNK_SIZE as u64
                {
                    return Err(TransferError::Malformed(format!(
                        "transfer {} announces {} chunks for {} bytes",
                        id, total_chunks, file_size
                    )));
                }

                let transfer = IncomingTransfer {
                    sender_id,
                    timestamp: ts,
                    file_name,
                    file_size,
                    mime_type,
                    slots: vec![None; total_chunks],
                    filled: 0,
                    started_at: now,
                };

                // Nothing to wait for.
                if transfer.is_complete() {
                    return transfer.assemble(id).map(|file| Some(Received::File(file)));
                }

                self.transfers.insert(id, transfer);
                Ok(None)
            }

            WireMessage::FileChunk {
                id, index, data, ..
            } => {
                let Some(transfer) = self.transfers.get_mut(&id) else {
                    return Ok(None);
                };
                let Some(slot) = transfer.slots.get_mut(index) else {
                    return Ok(None);
                };
                if slot.is_none() {
                    transfer.filled += 1;
                }
                *slot = Some(data);

                if !transfer.is_complete() {
                    return Ok(None);
                }
                match self.transfers.remove(&id) {
                    Some(done) => done.assemble(id).map(|file| Some(Received::File(file))),
                    None => Ok(None),
                }
            }
        }
    }

    pub fn in_progress(&self) -> usize {
        self.transfers.len()
    }

    /// Drops descriptors older than `max_age`, returning their ids.
    pub fn prune_stale(&mut self, max_age: Duration, now: Instant) -> Vec<String> {
        let stale: Vec<String> = self
            .transfers
            .iter()
            .filter(|(_, t)| now.saturating_duration_since(t.started_at) > max_age)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            self.transfers.remove(id);
        }
        stale
    }

    pub fn clear(&mut self) {
        self.transfers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(id: &str, size: u64, chunks: usize) -> WireMessage {
        WireMessage::FileMeta {
            id: id.into(),
            sender_id: "bob".into(),
            ts: 10,
            file_name: "photo.png".into(),
            file_size: size,
            mime_type: "image/png".into(),
            total_chunks: chunks,
        }
    }

    fn chunk(id: &str, index: usize, bytes: &[u8]) -> WireMessage {
        WireMessage::FileChunk {
            id: id.into(),
            sender_id: "bob".into(),
            ts: 11,
            index,
            data: STANDARD.encode(bytes),
        }
    }

    #[test]
    fn test_out_of_order_chunks_reassemble_in_index_order() {
        let mut reassembler = Reassembler::new();
        let now = Instant::now();

        assert_eq!(reassembler.accept(meta("f1", 9, 3), now).unwrap(), None);
        assert_eq!(reassembler.accept(chunk("f1", 2, b"ghi"), now).unwrap(), None);
        assert_eq!(reassembler.accept(chunk("f1", 0, b"abc"), now).unwrap(), None);
        let done = reassembler.accept(chunk("f1", 1, b"def"), now).unwrap();

        match done {
            Some(Received::File(file)) => {
                assert_eq!(file.data, b"abcdefghi");
                assert_eq!(file.file_name, "photo.png");
                assert_eq!(file.sender_id, "bob");
            }
            other => panic!("expected file, got {:?}", other),
        }
        assert_eq!(reassembler.in_progress(), 0);
    }

    #[test]
    fn test_completes_exactly_once() {
        let mut reassembler = Reassembler::new();
        let now = Instant::now();

        reassembler.accept(meta("f1", 3, 1), now).unwrap();
        assert!(reassembler.accept(chunk("f1", 0, b"abc"), now).unwrap().is_some());
        assert_eq!(reassembler.accept(chunk("f1", 0, b"abc"), now).unwrap(), None);
    }

    #[test]
    fn test_stray_chunks_are_ignored() {
        let mut reassembler = Reassembler::new();
        let now = Instant::now();

        assert_eq!(reassembler.accept(chunk("nope", 0, b"x"), now).unwrap(), None);

        reassembler.accept(meta("f1", 6, 2), now).unwrap();
        assert_eq!(reassembler.accept(chunk("f1", 5, b"zzz"), now).unwrap(), None);
        assert_eq!(reassembler.accept(chunk("f1", 0, b"abc"), now).unwrap(), None);
        assert_eq!(reassembler.accept(chunk("f1", 0, b"abc"), now).unwrap(), None);
        assert_eq!(reassembler.in_progress(), 1);
    }

    #[test]
    fn test_empty_file_completes_on_meta() {
        let mut reassembler = Reassembler::new();

        let done = reassembler.accept(meta("f0", 0, 0), Instant::now()).unwrap();

        assert!(matches!(done, Some(Received::File(file)) if file.data.is_empty()));
    }

    #[test]
    fn test_implausible_meta_is_rejected() {
        let mut reassembler = Reassembler::new();

        let result = reassembler.accept(meta("f1", 10, 11), Instant::now());

        assert!(matches!(result, Err(TransferError::Malformed(_))));
        assert_eq!(reassembler.in_progress(), 0);
    }

    #[test]
    fn test_size_beyond_announced_chunks_is_rejected() {
        let mut reassembler = Reassembler::new();
        let now = Instant::now();

        let huge = reassembler.accept(meta("f1", u64::MAX, 1), now);
        let oversized = reassembler.accept(meta("f2", CHUNK_SIZE as u64 * 2 + 1, 2), now);

        assert!(matches!(huge, Err(TransferError::Malformed(_))));
        assert!(matches!(oversized, Err(TransferError::Malformed(_))));
        assert_eq!(reassembler.in_progress(), 0);
        assert_eq!(reassembler.accept(chunk("f1", 0, b"A"), now).unwrap(), None);
    }

    #[test]
    fn test_full_final_chunk_is_accepted() {
        let mut reassembler = Reassembler::new();
        let now = Instant::now();
        let bytes = vec![3u8; CHUNK_SIZE * 2];

        reassembler.accept(meta("f1", bytes.len() as u64, 2), now).unwrap();
        reassembler.accept(chunk("f1", 0, &bytes[..CHUNK_SIZE]), now).unwrap();
        let done = reassembler.accept(chunk("f1", 1, &bytes[CHUNK_SIZE..]), now).unwrap();

        assert!(matches!(done, Some(Received::File(file)) if file.data == bytes));
    }

    #[test]
    fn test_repeated_meta_keeps_received_chunks() {
        let mut reassembler = Reassembler::new();
        let now = Instant::now();
        reassembler.accept(meta("f1", 6, 2), now).unwrap();
        reassembler.accept(chunk("f1", 0, b"abc"), now).unwrap();

        assert_eq!(reassembler.accept(meta("f1", 6, 2), now).unwrap(), None);
        let done = reassembler.accept(chunk("f1", 1, b"def"), now).unwrap();

        assert!(matches!(done, Some(Received::File(file)) if file.data == b"abcdef"));
        assert_eq!(reassembler.in_progress(), 0);
    }

    #[test]
    fn test_bad_base64_discards_transfer() {
        let mut reassembler = Reassembler::new();
        let now = Instant::now();
        reassembler.accept(meta("f1", 3, 1), now).unwrap();

        let bad = WireMessage::FileChunk {
            id: "f1".into(),
            sender_id: "bob".into(),
            ts: 1,
            index: 0,
            data: "!!!".into(),
        };

        assert_eq!(
            reassembler.accept(bad, now),
            Err(TransferError::InvalidChunk { id: "f1".into(), index: 0 })
        );
        assert_eq!(reassembler.in_progress(), 0);
    }

    #[test]
    fn test_prune_stale_drops_old_descriptors() {
        let mut reassembler = Reassembler::new();
        let start = Instant::now();
        reassembler.accept(meta("old", 6, 2), start).unwrap();
        reassembler
            .accept(meta("new", 6, 2), start + Duration::from_secs(50))
            .unwrap();

        let pruned = reassembler.prune_stale(Duration::from_secs(30), start + Duration::from_secs(60));

        assert_eq!(pruned, vec!["old".to_string()]);
        assert_eq!(reassembler.in_progress(), 1);
        assert_eq!(reassembler.accept(chunk("old", 0, b"abc"), start).unwrap(), None);
    }
}
