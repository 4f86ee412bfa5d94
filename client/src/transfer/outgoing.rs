use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use super::message::{WireMessage, new_message_id, now_millis};
use crate::error::TransferError;
use crate::transport::DataChannel;

pub const CHUNK_SIZE: usize = 16 * 1024;
pub const MAX_BUFFERED_AMOUNT: usize = 64 * 1024;

/// A file fully handed to the data channel.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingFile {
    pub id: String,
    pub timestamp: i64,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub total_chunks: usize,
}

/// Sender side of the chunked transfer protocol.
#[derive(Clone)]
pub struct FileSender {
    chunk_size: usize,
    max_buffered_amount: usize,
    logger: logging::Logger,
}

impl FileSender {
    /// Chunks larger than [`CHUNK_SIZE`] are refused by receivers, so the
    /// configured size is capped there.
    pub fn new(chunk_size: usize, max_buffered_amount: usize, logger: logging::Logger) -> Self {
        FileSender {
            chunk_size: chunk_size.clamp(1, CHUNK_SIZE),
            max_buffered_amount: max_buffered_amount.max(1),
            logger,
        }
    }

    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    /// Sends the meta message, then every chunk in index order.
    ///
    /// Blocks before each chunk until the channel's buffered amount drops
    /// below the threshold. Gives up, without telling the remote side, as
    /// soon as the channel is no longer open.
    pub fn send(
        &self,
        channel: &dyn DataChannel,
        sender_id: &str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<OutgoingFile, TransferError> {
        let total_chunks = self.chunk_count(bytes.len());
        let file = OutgoingFile {
            id: new_message_id(),
            timestamp: now_millis(),
            file_name: file_name.to_string(),
            file_size: bytes.len() as u64,
            mime_type: mime_type.to_string(),
            total_chunks,
        };

        if !channel.is_open() {
            return Err(TransferError::ChannelClosed {
                sent: 0,
                total: total_chunks,
            });
        }

        let meta = WireMessage::FileMeta {
            id: file.id.clone(),
            sender_id: sender_id.to_string(),
            ts: file.timestamp,
            file_name: file.file_name.clone(),
            file_size: file.file_size,
            mime_type: file.mime_type.clone(),
            total_chunks,
        };
        channel.send_text(&meta.encode()?)?;

        for (index, chunk) in bytes.chunks(self.chunk_size).enumerate() {
            if !channel.wait_buffered_below(self.max_buffered_amount) {
                self.logger.warn(&format!(
                    "Transfer {} aborted after {}/{} chunks: channel closed",
                    file.id, index, total_chunks
                ));
                return Err(TransferError::ChannelClosed {
                    sent: index,
                    total: total_chunks,
                });
            }

            let message = WireMessage::FileChunk {
                id: file.id.clone(),
                sender_id: sender_id.to_string(),
                ts: now_millis(),
                index,
                data: STANDARD.encode(chunk),
            };
            channel.send_text(&message.encode()?)?;
        }

        self.logger.info(&format!(
            "Transfer {} sent: {} bytes in {} chunk(s)",
            file.id, file.file_size, total_chunks
        ));
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockDataChannel;

    fn sent_messages(channel: &MockDataChannel) -> Vec<WireMessage> {
        channel
            .sent()
            .iter()
            .map(|text| WireMessage::decode(text).unwrap())
            .collect()
    }

    #[test]
    fn test_meta_then_chunks_in_order() {
        let channel = MockDataChannel::open("dm");
        let sender = FileSender::new(CHUNK_SIZE, MAX_BUFFERED_AMOUNT, logging::Logger::disabled());
        let bytes = vec![7u8; CHUNK_SIZE * 2 + 100];

        let file = sender
            .send(&channel, "alice", "blob.bin", "application/octet-stream", &bytes)
            .unwrap();

        assert_eq!(file.total_chunks, 3);
        let messages = sent_messages(&channel);
        assert_eq!(messages.len(), 4);
        assert!(matches!(&messages[0], WireMessage::FileMeta { total_chunks: 3, file_size, .. } if *file_size == bytes.len() as u64));
        for (expected, message) in messages[1..].iter().enumerate() {
            match message {
                WireMessage::FileChunk { index, id, .. } => {
                    assert_eq!(*index, expected);
                    assert_eq!(id, &file.id);
                }
                other => panic!("expected chunk, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_empty_file_sends_meta_only() {
        let channel = MockDataChannel::open("dm");
        let sender = FileSender::new(CHUNK_SIZE, MAX_BUFFERED_AMOUNT, logging::Logger::disabled());

        let file = sender.send(&channel, "alice", "empty", "text/plain", &[]).unwrap();

        assert_eq!(file.total_chunks, 0);
        assert_eq!(channel.sent().len(), 1);
    }

    #[test]
    fn test_oversized_chunk_setting_is_capped() {
        let sender = FileSender::new(CHUNK_SIZE * 4, MAX_BUFFERED_AMOUNT, logging::Logger::disabled());

        assert_eq!(sender.chunk_count(CHUNK_SIZE * 4), 4);
    }

    #[test]
    fn test_closed_channel_sends_nothing() {
        let channel = MockDataChannel::open("dm");
        channel.close();
        let sender = FileSender::new(CHUNK_SIZE, MAX_BUFFERED_AMOUNT, logging::Logger::disabled());

        let result = sender.send(&channel, "alice", "a", "text/plain", b"abc");

        assert_eq!(result, Err(TransferError::ChannelClosed { sent: 0, total: 1 }));
        assert!(channel.sent().is_empty());
    }

    #[test]
    fn test_aborts_when_channel_closes_while_waiting() {
        let channel = std::sync::Arc::new(MockDataChannel::open("dm"));
        channel.set_auto_drain(false);
        let sender = FileSender::new(1024, 2048, logging::Logger::disabled());

        let closer = {
            let channel = std::sync::Arc::clone(&channel);
            std::thread::spawn(move || {
                while channel.sent().len() < 3 {
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
                channel.close();
            })
        };

        let result = sender.send(channel.as_ref(), "alice", "big", "text/plain", &vec![1u8; 10 * 1024]);
        closer.join().unwrap();

        match result {
            Err(TransferError::ChannelClosed { sent, total }) => {
                assert_eq!(total, 10);
                assert!(sent < total);
            }
            other => panic!("expected abort, got {:?}", other),
        }
    }
}
