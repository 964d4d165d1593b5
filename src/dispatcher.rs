//! Prompt dispatcher.
//!
//! Turns a [`TaskRequest`] into exactly one agent session and relays its
//! response units. Nothing is retried: the first error ends the stream.

use crate::agent::Agent;
use crate::error::Error;
use crate::options::{SessionConfig, SettingSource};
use crate::task::{TaskKind, TaskRequest};
use crate::types::ResponseStream;
use async_stream::stream;
use futures::StreamExt;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;

/// Dispatches task requests to an [`Agent`].
pub struct Dispatcher<A> {
    agent: A,
    setting_sources: Vec<SettingSource>,
    timeout: Option<Duration>,
}

impl<A: Agent> Dispatcher<A> {
    pub fn new(agent: A) -> Self {
        Self {
            agent,
            setting_sources: SettingSource::DEFAULT_PRECEDENCE.to_vec(),
            timeout: None,
        }
    }

    /// Deadline for a whole request, from session open to the final unit.
    ///
    /// A duration too large to add to the current instant means no deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_setting_sources(mut self, sources: impl IntoIterator<Item = SettingSource>) -> Self {
        self.setting_sources = sources.into_iter().collect();
        self
    }

    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// Session configuration used for `kind`.
    pub fn session_config(&self, kind: TaskKind) -> SessionConfig {
        SessionConfig::builder()
            .capabilities(kind.capabilities())
            .setting_sources(self.setting_sources.iter().copied())
            .build()
    }

    /// Run `request` to completion or first failure.
    pub fn run(&self, request: &TaskRequest) -> ResponseStream<'_> {
        self.run_until(request, std::future::pending())
    }

    /// Like [`run`](Self::run), but stops with [`Error::Cancelled`] as soon
    /// as `cancel` resolves.
    ///
    /// Invalid requests fail with [`Error::InvalidInput`] before the agent is
    /// contacted. The stream ends after the final unit or the first error.
    pub fn run_until<C>(&self, request: &TaskRequest, cancel: C) -> ResponseStream<'_>
    where
        C: Future<Output = ()> + Send + 'static,
    {
        let kind = request.kind();
        let rendered = request.render();
        let config = self.session_config(kind);
        let timeout = self.timeout;

        let stream = stream! {
            // a deadline past what Instant can represent is no deadline
            let deadline = timeout.and_then(|t| Instant::now().checked_add(t).map(|at| (at, t)));
            let instruction = match rendered {
                Ok(instruction) => instruction,
                Err(e) => {
                    tracing::debug!(task = %kind, "rejecting request: {}", e);
                    yield Err(e);
                    return;
                }
            };

            tracing::info!(
                task = %kind,
                tools = ?config.capabilities.tool_names(),
                "dispatching request"
            );

            tokio::pin!(cancel);

            let open = self.agent.open_session(&config);
            let session = tokio::select! {
                biased;
                _ = &mut cancel => Err(Error::Cancelled),
                _ = sleep_until(deadline) => Err(timeout_error(deadline)),
                session = open => session,
            };
            let session = match session {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!(task = %kind, "could not open session: {}", e);
                    yield Err(e);
                    return;
                }
            };

            let mut units = session.submit(instruction);
            let mut saw_final = false;
            loop {
                let next = tokio::select! {
                    biased;
                    _ = &mut cancel => Some(Err(Error::Cancelled)),
                    _ = sleep_until(deadline) => Some(Err(timeout_error(deadline))),
                    next = units.next() => next,
                };
                match next {
                    Some(Ok(unit)) => {
                        let is_final = unit.is_final();
                        yield Ok(unit);
                        if is_final {
                            saw_final = true;
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::warn!(task = %kind, "request failed: {}", e);
                        yield Err(e);
                        return;
                    }
                    None => break,
                }
            }

            if saw_final {
                tracing::info!(task = %kind, "request complete");
            } else {
                yield Err(Error::Stream(
                    "agent stream ended without a final result".to_string(),
                ));
            }
        };

        Box::pin(stream)
    }
}

async fn sleep_until(deadline: Option<(Instant, Duration)>) {
    match deadline {
        Some((at, _)) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

fn timeout_error(deadline: Option<(Instant, Duration)>) -> Error {
    Error::Timeout(deadline.map(|(_, t)| t).unwrap_or_default())
}
