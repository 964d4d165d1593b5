//! Transport implementations for talking to the agent process.

mod subprocess_cli;

pub use subprocess_cli::SubprocessCliTransport;

use crate::error::Result;
use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;

/// Abstract transport for agent communication.
///
/// This is a low-level interface that handles raw line-delimited JSON I/O
/// with the agent process.
#[async_trait]
pub trait Transport: Send {
    /// Start the process and prepare for communication.
    async fn connect(&mut self) -> Result<()>;

    /// Write raw data to the transport.
    async fn write(&mut self, data: &str) -> Result<()>;

    /// Read JSON messages from the transport.
    /// Returns an owned stream so the transport can still be closed while it is alive.
    fn read_messages(&mut self) -> Pin<Box<dyn Stream<Item = Result<serde_json::Value>> + Send>>;

    /// End the input stream (close stdin for process transports).
    async fn end_input(&mut self) -> Result<()>;

    /// Wait for the process to exit on its own.
    ///
    /// Returns [`Error::Stream`](crate::error::Error::Stream) when it exits unsuccessfully.
    async fn finish(&mut self) -> Result<()>;

    /// Terminate the process if it is still running.
    async fn close(&mut self) -> Result<()>;

    /// Check if transport is ready for communication.
    fn is_ready(&self) -> bool;
}
