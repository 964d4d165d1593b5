//! Claude Code CLI agent.
//!
//! Implements [`Agent`] by spawning the `claude` binary once per session in
//! `stream-json` mode. The instruction is written as a single user message,
//! stdin is closed, and stdout is parsed until the result message arrives.

pub mod cli_finder;
pub mod command_builder;
pub mod message_parser;

use crate::agent::{Agent, AgentSession};
use crate::error::{Error, Result};
use crate::options::{ClaudeOptions, SessionConfig};
use crate::transport::{SubprocessCliTransport, Transport};
use crate::types::ResponseStream;
use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;

/// Agent backed by the Claude Code CLI.
#[derive(Debug, Clone, Default)]
pub struct ClaudeAgent {
    options: ClaudeOptions,
}

impl ClaudeAgent {
    pub fn new(options: ClaudeOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ClaudeOptions {
        &self.options
    }
}

#[async_trait]
impl Agent for ClaudeAgent {
    async fn open_session(&self, config: &SessionConfig) -> Result<Box<dyn AgentSession>> {
        let cli_path = cli_finder::find_cli(&self.options)?;

        if self.options.check_version
            && std::env::var_os("CLAUDE_AGENT_SDK_SKIP_VERSION_CHECK").is_none()
        {
            cli_finder::check_claude_version(&cli_path).await;
        }

        let cmd = command_builder::build_command(&cli_path.to_string_lossy(), &self.options, config);
        let mut transport = SubprocessCliTransport::new(
            cmd,
            self.options.cwd.clone(),
            self.options.env.clone(),
            self.options.max_buffer_size,
        );
        transport.connect().await?;

        Ok(Box::new(ClaudeSession::new(transport)))
    }
}

/// One Claude CLI process carrying a single request.
pub struct ClaudeSession<T> {
    transport: T,
}

impl<T: Transport> ClaudeSession<T> {
    /// Wrap an already connected transport.
    pub fn new(transport: T) -> Self {
        Self { transport }
    }
}

impl<T: Transport + 'static> AgentSession for ClaudeSession<T> {
    fn submit(self: Box<Self>, instruction: String) -> ResponseStream<'static> {
        let mut transport = self.transport;

        let stream = stream! {
            if !transport.is_ready() {
                yield Err(Error::Session("agent transport is not connected".to_string()));
                return;
            }
            let line = command_builder::user_message_line(&instruction);
            if let Err(e) = transport.write(&line).await {
                yield Err(e);
                let _ = transport.close().await;
                return;
            }
            if let Err(e) = transport.end_input().await {
                yield Err(e);
                let _ = transport.close().await;
                return;
            }

            let mut done = false;
            {
                let mut messages = transport.read_messages();
                while let Some(item) = messages.next().await {
                    let parsed = item.and_then(|data| message_parser::parse_message(&data));
                    match parsed {
                        Ok(Some(unit)) => {
                            let is_final = unit.is_final();
                            yield Ok(unit);
                            if is_final {
                                done = true;
                                break;
                            }
                        }
                        Ok(None) => continue,
                        Err(e) => {
                            yield Err(e);
                            done = true;
                            break;
                        }
                    }
                }
            }

            if done {
                let _ = transport.close().await;
                return;
            }

            // stdout closed before a result arrived
            match transport.finish().await {
                Ok(()) => yield Err(Error::Stream(
                    "agent stream ended without a final result".to_string(),
                )),
                Err(e) => yield Err(e),
            }
        };

        Box::pin(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ResponseUnit;
    use futures::Stream;
    use serde_json::json;
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    /// In-memory transport replaying canned stdout.
    struct ScriptedTransport {
        output: Vec<Result<serde_json::Value>>,
        exit: Option<Error>,
        written: Arc<Mutex<Vec<String>>>,
        ready: bool,
    }

    impl ScriptedTransport {
        fn new(output: Vec<Result<serde_json::Value>>) -> Self {
            Self {
                output,
                exit: None,
                written: Arc::new(Mutex::new(Vec::new())),
                ready: true,
            }
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn connect(&mut self) -> Result<()> {
            Ok(())
        }

        async fn write(&mut self, data: &str) -> Result<()> {
            self.written.lock().unwrap().push(data.to_string());
            Ok(())
        }

        fn read_messages(&mut self) -> Pin<Box<dyn Stream<Item = Result<serde_json::Value>> + Send>> {
            Box::pin(futures::stream::iter(std::mem::take(&mut self.output)))
        }

        async fn end_input(&mut self) -> Result<()> {
            Ok(())
        }

        async fn finish(&mut self) -> Result<()> {
            match self.exit.take() {
                Some(e) => Err(e),
                None => Ok(()),
            }
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }

        fn is_ready(&self) -> bool {
            self.ready
        }
    }

    async fn collect(transport: ScriptedTransport) -> Vec<Result<ResponseUnit>> {
        Box::new(ClaudeSession::new(transport))
            .submit("hello".to_string())
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_submit_writes_instruction_and_relays_units() {
        let transport = ScriptedTransport::new(vec![
            Ok(json!({"type": "system", "subtype": "init"})),
            Ok(json!({
                "type": "assistant",
                "message": {"model": "m", "content": [{"type": "text", "text": "looking"}]}
            })),
            Ok(json!({"type": "result", "subtype": "success", "is_error": false, "result": "done"})),
            Ok(json!({"type": "assistant", "message": {"content": [{"type": "text", "text": "late"}]}})),
        ]);
        let written = Arc::clone(&transport.written);

        let units = collect(transport).await;
        let units: Vec<ResponseUnit> = units.into_iter().map(|u| u.unwrap()).collect();
        assert_eq!(units.len(), 2);
        assert_eq!(units[0], ResponseUnit::partial("looking"));
        assert_eq!(units[1].text(), "done");
        assert!(units[1].is_final());

        let written = written.lock().unwrap();
        assert_eq!(written.len(), 1);
        assert!(written[0].contains("\"content\":\"hello\""));
    }

    #[tokio::test]
    async fn test_unconnected_transport_is_session_error() {
        let mut transport = ScriptedTransport::new(vec![Ok(json!({
            "type": "result", "subtype": "success", "is_error": false, "result": "done"
        }))]);
        transport.ready = false;
        let written = Arc::clone(&transport.written);

        let units = collect(transport).await;
        assert_eq!(units.len(), 1);
        assert!(matches!(units[0], Err(Error::Session(_))));
        assert!(written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_result_is_stream_error() {
        let transport = ScriptedTransport::new(vec![Ok(json!({
            "type": "assistant",
            "message": {"content": [{"type": "text", "text": "partial only"}]}
        }))]);

        let units = collect(transport).await;
        assert_eq!(units.len(), 2);
        assert!(units[0].is_ok());
        assert!(matches!(units[1], Err(Error::Stream(ref m)) if m.contains("without a final result")));
    }

    #[tokio::test]
    async fn test_process_failure_is_reported() {
        let mut transport = ScriptedTransport::new(vec![]);
        transport.exit = Some(Error::Stream("Agent process failed with exit code 2".to_string()));

        let units = collect(transport).await;
        assert_eq!(units.len(), 1);
        assert!(matches!(units[0], Err(Error::Stream(ref m)) if m.contains("exit code 2")));
    }

    #[tokio::test]
    async fn test_read_error_stops_stream() {
        let transport = ScriptedTransport::new(vec![
            Err(Error::Stream("broken pipe".to_string())),
            Ok(json!({"type": "result", "subtype": "success", "result": "never"})),
        ]);

        let units = collect(transport).await;
        assert_eq!(units.len(), 1);
        assert!(matches!(units[0], Err(Error::Stream(_))));
    }
}
