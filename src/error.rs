//! Error types for the Lena dispatcher.

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing, blank or unknown task parameters. Raised before any session is opened.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The agent session could not be established.
    #[error("Session error: {0}")]
    Session(String),

    /// Communication with the agent failed after the session was opened.
    #[error("Stream error: {0}")]
    Stream(String),

    #[error("Agent did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error was detected before the agent was contacted.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
