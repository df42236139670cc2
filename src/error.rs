//! Error types
//!
//! A single crate-wide [`Error`] plus the container-level [`DecodeError`].

use std::fmt;
use std::io;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Container-level decode failure
///
/// Terminal for the whole worker. Consumers never see the cause; it is kept
/// in the worker's exit report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeError {
    message: String,
}

impl DecodeError {
    /// Create a decode error with a description of the failure
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Description of the failure
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "decode failed: {}", self.message)
    }
}

impl std::error::Error for DecodeError {}

/// Error type for source and track operations
#[derive(Debug)]
pub enum Error {
    /// The backend could not open the container
    Open(String),
    /// The container failed while decoding
    Decode(DecodeError),
    /// The track has ended; no further frames will arrive
    StreamEnded,
    /// The worker thread could not be spawned
    Spawn(io::Error),
    /// The worker thread panicked
    WorkerPanicked,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Open(reason) => write!(f, "Failed to open container: {}", reason),
            Error::Decode(e) => write!(f, "{}", e),
            Error::StreamEnded => write!(f, "Stream ended"),
            Error::Spawn(e) => write!(f, "Failed to spawn worker thread: {}", e),
            Error::WorkerPanicked => write!(f, "Worker thread panicked"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Decode(e) => Some(e),
            Error::Spawn(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DecodeError> for Error {
    fn from(e: DecodeError) -> Self {
        Error::Decode(e)
    }
}
