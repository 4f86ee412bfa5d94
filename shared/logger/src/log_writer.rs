//! File target: a dedicated thread appends every record it receives.

use crate::error::{LoggingError, Result};
use crate::log_message::LogMessage;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::mpsc::Receiver;
use std::thread;

pub(crate) struct LogWriter {
    out: BufWriter<File>,
}

impl LogWriter {
    pub fn open(log_path: &Path) -> Result<Self> {
        if let Some(parent) = log_path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)?;
        Ok(Self {
            out: BufWriter::new(file),
        })
    }

    fn write_message(&mut self, message: &LogMessage) {
        if let Err(e) = writeln!(self.out, "{}", message.line()) {
            eprintln!("log write failed: {}", e);
        }
    }

    /// Drains the channel, flushing whenever it momentarily runs dry.
    fn run(mut self, receiver: Receiver<LogMessage>) {
        while let Ok(message) = receiver.recv() {
            self.write_message(&message);
            for queued in receiver.try_iter() {
                self.write_message(&queued);
            }
            if let Err(e) = self.out.flush() {
                eprintln!("log flush failed: {}", e);
            }
        }
    }
}

pub(crate) fn spawn_writer_thread(log_path: &Path, receiver: Receiver<LogMessage>) -> Result<()> {
    let writer = LogWriter::open(log_path)?;
    thread::Builder::new()
        .name("log-writer".into())
        .spawn(move || writer.run(receiver))
        .map_err(|e| LoggingError::Logging(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log_level::LogLevel;
    use std::fs;
    use std::sync::mpsc::channel;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn test_open_creates_missing_directories() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("nested/logs/relay.log");

        assert!(LogWriter::open(&log_path).is_ok());
        assert!(log_path.exists());
    }

    #[test]
    fn test_writer_thread_flushes_batches() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("relay.log");
        let (sender, receiver) = channel();

        spawn_writer_thread(&log_path, receiver).unwrap();
        for i in 0..3 {
            sender
                .send(LogMessage::new(LogLevel::Info, None, &format!("line {i}")))
                .unwrap();
        }
        drop(sender);
        thread::sleep(Duration::from_millis(100));

        let content = fs::read_to_string(log_path).unwrap();
        assert_eq!(content.lines().count(), 3);
        assert!(content.contains("line 2"));
    }
}
