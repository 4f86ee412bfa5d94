//! The [`Logger`] handle and its output targets.

use crate::error::Result;
use crate::log_level::LogLevel;
use crate::log_message::LogMessage;
use crate::log_writer::spawn_writer_thread;
use std::path::Path;
use std::sync::mpsc::{Sender, channel};
use std::sync::{Arc, Mutex};

/// Lines captured by an in-memory logger.
#[derive(Clone, Default)]
pub struct LogBuffer {
    lines: Arc<Mutex<Vec<String>>>,
}

impl LogBuffer {
    pub fn lines(&self) -> Vec<String> {
        match self.lines.lock() {
            Ok(lines) => lines.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// True when any captured line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|line| line.contains(needle))
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

#[derive(Clone)]
enum Target {
    File(Sender<LogMessage>),
    Memory(LogBuffer),
    Discard,
}

/// Thread-safe, non-blocking logger.
///
/// Clones and component loggers share the same target, so every component of
/// a process ends up in one file.
///
/// ```
/// use logging::{Logger, LogLevel};
///
/// let (logger, buffer) = Logger::in_memory(LogLevel::Info);
/// let registry = logger.for_component("Registry");
/// registry.info("participant registered");
/// assert!(buffer.contains("[Registry]: participant registered"));
/// ```
#[derive(Clone)]
pub struct Logger {
    target: Target,
    level: LogLevel,
    component: Option<String>,
    console_output: bool,
}

impl Logger {
    /// Creates a file logger backed by its own writer thread.
    ///
    /// # Errors
    ///
    /// Returns error if the log file cannot be created or opened.
    pub fn new(log_path: &Path, level: LogLevel, console_output: bool) -> Result<Self> {
        let (sender, receiver) = channel();
        spawn_writer_thread(log_path, receiver)?;
        Ok(Logger {
            target: Target::File(sender),
            level,
            component: None,
            console_output,
        })
    }

    /// Creates a logger that records into memory, returning the buffer to read
    /// it back.
    pub fn in_memory(level: LogLevel) -> (Self, LogBuffer) {
        let buffer = LogBuffer::default();
        let logger = Logger {
            target: Target::Memory(buffer.clone()),
            level,
            component: None,
            console_output: false,
        };
        (logger, buffer)
    }

    /// A logger that drops everything.
    pub fn disabled() -> Self {
        Logger {
            target: Target::Discard,
            level: LogLevel::Error,
            component: None,
            console_output: false,
        }
    }

    /// Derives a logger tagged with `component` that writes to the same target.
    pub fn for_component(&self, component: &str) -> Self {
        Logger {
            component: Some(component.to_string()),
            ..self.clone()
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: &str) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Error, message);
    }

    fn log(&self, level: LogLevel, message: &str) {
        if level < self.level || matches!(self.target, Target::Discard) {
            return;
        }
        let msg = LogMessage::new(level, self.component.as_deref(), message);

        if self.console_output {
            println!("{}", msg.line());
        }

        match &self.target {
            Target::File(sender) => {
                let _ = sender.send(msg);
            }
            Target::Memory(buffer) => buffer.push(msg.line()),
            Target::Discard => {}
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Logger::disabled()
    }
}
