//! Boundary to the external agent runtime.
//!
//! This module defines the [`Agent`] and [`AgentSession`] traits. The
//! dispatcher depends only on these; [`claude::ClaudeAgent`] is the
//! production implementation backed by the Claude Code CLI.

pub mod claude;

use crate::error::Result;
use crate::options::SessionConfig;
use crate::types::ResponseStream;
use async_trait::async_trait;

/// Something that can open agent sessions.
///
/// # Object Safety
///
/// This trait uses `async_trait` so it can be boxed for runtime selection
/// and mocked in tests.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Open one session restricted to `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`](crate::error::Error::Session) on
    /// misconfiguration or when the agent cannot be started.
    async fn open_session(&self, config: &SessionConfig) -> Result<Box<dyn AgentSession>>;
}

/// A single-use agent session.
///
/// Submitting consumes the session: each session carries exactly one
/// instruction and its response stream.
pub trait AgentSession: Send {
    /// Submit `instruction` and return the agent's response units.
    ///
    /// Failures after submission surface as
    /// [`Error::Stream`](crate::error::Error::Stream) items.
    fn submit(self: Box<Self>, instruction: String) -> ResponseStream<'static>;
}

#[async_trait]
impl<A: Agent + ?Sized> Agent for Box<A> {
    async fn open_session(&self, config: &SessionConfig) -> Result<Box<dyn AgentSession>> {
        (**self).open_session(config).await
    }
}

#[async_trait]
impl<A: Agent + ?Sized> Agent for std::sync::Arc<A> {
    async fn open_session(&self, config: &SessionConfig) -> Result<Box<dyn AgentSession>> {
        (**self).open_session(config).await
    }
}
