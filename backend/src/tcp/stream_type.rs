//! Plain TCP or TLS, behind one type.

use std::io;
use std::net::{Shutdown, TcpStream};
use std::time::Duration;

use signaling_protocol::{Message, ProtocolError, read_message, write_message};

pub(crate) enum StreamType {
    Plain(TcpStream),
    Tls(Box<native_tls::TlsStream<TcpStream>>),
}

impl StreamType {
    fn tcp(&self) -> &TcpStream {
        match self {
            StreamType::Plain(stream) => stream,
            StreamType::Tls(stream) => stream.get_ref(),
        }
    }

    pub(crate) fn set_read_timeout(&self, duration: Duration) -> io::Result<()> {
        self.tcp().set_read_timeout(Some(duration))
    }

    pub(crate) fn read_message(&mut self) -> Result<Message, ProtocolError> {
        match self {
            StreamType::Plain(stream) => read_message(stream),
            StreamType::Tls(stream) => read_message(stream.as_mut()),
        }
    }

    pub(crate) fn write_message(&mut self, msg: &Message) -> Result<(), ProtocolError> {
        match self {
            StreamType::Plain(stream) => write_message(stream, msg),
            StreamType::Tls(stream) => write_message(stream.as_mut(), msg),
        }
    }

    pub(crate) fn shutdown(&mut self) {
        let _ = match self {
            StreamType::Plain(stream) => stream.shutdown(Shutdown::Both),
            StreamType::Tls(stream) => stream.shutdown(),
        };
    }
}
