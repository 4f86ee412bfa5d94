//! Component-tagged logging shared by the relay and the client.
//!
//! A [`Logger`] writes through one of three targets: a log file drained by a
//! dedicated writer thread, an in-memory [`LogBuffer`] used by tests, or
//! nowhere at all. Loggers derived with [`Logger::for_component`] share the
//! target of their parent.

pub mod error;
mod log_level;
mod log_message;
mod log_writer;
mod logger;

pub use error::{LoggingError, Result};
pub use log_level::LogLevel;
pub use logger::{LogBuffer, Logger};
