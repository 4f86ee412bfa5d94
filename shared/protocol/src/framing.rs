use std::io::{self, ErrorKind, Read, Write};
use std::thread;
use std::time::Duration;

use crate::error::{ProtocolError, Result};
use crate::message::Message;

pub const MAX_MESSAGE_SIZE: u32 = 1024 * 1024;
const RETRY_DELAY_MS: u64 = 10;

/// Fills `buf` completely, tolerating read timeouts once a frame has started.
///
/// A timeout before the first byte is returned to the caller untouched so a
/// connection loop can go service its outbound queue. A timeout in the middle
/// of a frame is retried, otherwise the stream would desynchronize.
fn read_exact_with_retry<S: Read>(
    stream: &mut S,
    buf: &mut [u8],
    frame_started: bool,
    what: &str,
) -> io::Result<()> {
    let mut total_read = 0;

    while total_read < buf.len() {
        match stream.read(&mut buf[total_read..]) {
            Ok(0) => {
                return Err(io::Error::new(
                    ErrorKind::UnexpectedEof,
                    format!("connection closed while reading {}", what),
                ));
            }
            Ok(n) => total_read += n,
            Err(e)
                if matches!(
                    e.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                if total_read == 0 && !frame_started && e.kind() != ErrorKind::Interrupted {
                    return Err(e);
                }
                thread::sleep(Duration::from_millis(RETRY_DELAY_MS));
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Reads one frame and decodes it.
pub fn read_message<S: Read>(stream: &mut S) -> Result<Message> {
    let mut len_buf = [0u8; 4];
    read_exact_with_retry(stream, &mut len_buf, false, "length header")?;
    let len = u32::from_be_bytes(len_buf);

    if len == 0 {
        return Err(ProtocolError::EmptyFrame);
    }
    if len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut body = vec![0u8; len as usize];
    read_exact_with_retry(stream, &mut body, true, "frame body")?;

    Message::try_from((body[0], &body[1..]))
}

/// Serializes a message into a complete frame.
pub fn encode_frame(message: &Message) -> Result<Vec<u8>> {
    let payload = message.to_payload()?;
    let total_len = u32::try_from(payload.len() + 1)
        .map_err(|_| ProtocolError::MessageTooLarge(u32::MAX))?;

    if total_len > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::MessageTooLarge(total_len));
    }

    let mut frame = Vec::with_capacity(4 + total_len as usize);
    frame.extend_from_slice(&total_len.to_be_bytes());
    frame.push(message.message_type() as u8);
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// Writes one frame with a single `write_all`, then flushes.
pub fn write_message<S: Write>(stream: &mut S, message: &Message) -> Result<()> {
    let frame = encode_frame(message)?;
    stream.write_all(&frame)?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message_type::MessageType;
    use crate::messages::{CandidateInit, ErrorMsg, IceMsg, PeerMsg};
    use std::io::Cursor;

    /// Yields a WouldBlock between every chunk it hands out.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        block_next: bool,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.block_next {
                self.block_next = false;
                return Err(io::Error::new(ErrorKind::WouldBlock, "not yet"));
            }
            self.block_next = true;
            if self.pos >= self.data.len() {
                return Ok(0);
            }
            let n = buf.len().min(3).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_frame_layout() {
        let msg = Message::RequestSession(PeerMsg::new("bob"));
        let frame = encode_frame(&msg).unwrap();

        let len = u32::from_be_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
        assert_eq!(len, frame.len() - 4);
        assert_eq!(frame[4], MessageType::RequestSession as u8);
    }

    #[test]
    fn test_write_then_read_back() {
        let msg = Message::IceCandidate(IceMsg {
            peer_id: "bob".into(),
            candidate: CandidateInit::new("candidate:42"),
        });
        let mut buf = Vec::new();
        write_message(&mut buf, &msg).unwrap();

        let decoded = read_message(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_message_too_large() {
        let msg = Message::Error(ErrorMsg {
            code: 0,
            message: "x".repeat(MAX_MESSAGE_SIZE as usize),
        });
        assert!(matches!(
            write_message(&mut Vec::new(), &msg),
            Err(ProtocolError::MessageTooLarge(_))
        ));
    }

    #[test]
    fn test_read_invalid_message_type() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&3u32.to_be_bytes());
        buf.push(0xFF);
        buf.extend_from_slice(b"{}");

        let result = read_message(&mut Cursor::new(buf));
        assert!(matches!(result, Err(ProtocolError::InvalidMessageType(0xFF))));
    }

    #[test]
    fn test_zero_length_frame_rejected() {
        let result = read_message(&mut Cursor::new(0u32.to_be_bytes().to_vec()));
        assert!(matches!(result, Err(ProtocolError::EmptyFrame)));
    }

    #[test]
    fn test_truncated_header() {
        let result = read_message(&mut Cursor::new(vec![0u8, 1u8]));
        assert!(matches!(result, Err(ProtocolError::Io(_))));
    }

    #[test]
    fn test_timeout_before_frame_is_reported() {
        let mut stream = Trickle {
            data: Vec::new(),
            pos: 0,
            block_next: true,
        };
        let err = read_message(&mut stream).unwrap_err();
        assert!(err.is_timeout());
    }

    #[test]
    fn test_timeouts_inside_frame_are_retried() {
        let msg = Message::SessionAccepted(PeerMsg::new("alice"));
        let mut stream = Trickle {
            data: encode_frame(&msg).unwrap(),
            pos: 0,
            block_next: false,
        };
        assert_eq!(read_message(&mut stream).unwrap(), msg);
    }
}
