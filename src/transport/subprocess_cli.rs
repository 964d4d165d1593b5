//! Subprocess transport for the Claude Code CLI.

use crate::error::{Error, Result};
use crate::transport::Transport;
use async_stream::stream;
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

const STDERR_TAIL_LINES: usize = 20;

pub struct SubprocessCliTransport {
    command: Vec<String>,
    cwd: Option<PathBuf>,
    env: HashMap<String, String>,
    max_buffer_size: usize,
    process: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr_tail: Arc<Mutex<VecDeque<String>>>,
    stderr_task: Option<JoinHandle<()>>,
    ready: bool,
}

impl SubprocessCliTransport {
    /// `command[0]` is the program; the rest are its arguments.
    pub fn new(
        command: Vec<String>,
        cwd: Option<PathBuf>,
        env: HashMap<String, String>,
        max_buffer_size: usize,
    ) -> Self {
        Self {
            command,
            cwd,
            env,
            max_buffer_size,
            process: None,
            stdin: None,
            stdout: None,
            stderr_tail: Arc::new(Mutex::new(VecDeque::with_capacity(STDERR_TAIL_LINES))),
            stderr_task: None,
            ready: false,
        }
    }

    fn stderr_summary(&self) -> Option<String> {
        let tail = self.stderr_tail.lock().ok()?;
        if tail.is_empty() {
            None
        } else {
            Some(tail.iter().cloned().collect::<Vec<_>>().join("\n"))
        }
    }
}

#[async_trait::async_trait]
impl Transport for SubprocessCliTransport {
    async fn connect(&mut self) -> Result<()> {
        if self.process.is_some() {
            return Ok(());
        }

        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| Error::Session("empty agent command".to_string()))?;

        if let Some(ref cwd) = self.cwd
            && !cwd.is_dir()
        {
            return Err(Error::Session(format!(
                "Working directory does not exist: {}",
                cwd.display()
            )));
        }

        let mut child_cmd = Command::new(program);
        child_cmd
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .env("CLAUDE_CODE_ENTRYPOINT", "sdk-rs")
            .env("LENA_VERSION", env!("CARGO_PKG_VERSION"));

        for (k, v) in &self.env {
            child_cmd.env(k, v);
        }
        if let Some(ref cwd) = self.cwd {
            child_cmd.env("PWD", cwd);
            child_cmd.current_dir(cwd);
        }

        tracing::debug!(program = %program, args = ?args, "spawning agent process");

        let mut process = child_cmd.spawn().map_err(|e| {
            Error::Session(format!("Failed to start agent at {}: {}", program, e))
        })?;

        self.stdin = process.stdin.take();
        self.stdout = process.stdout.take();

        if let Some(stderr) = process.stderr.take() {
            let tail = Arc::clone(&self.stderr_tail);
            self.stderr_task = Some(tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let line = line.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    tracing::debug!("agent stderr: {}", line);
                    if let Ok(mut tail) = tail.lock() {
                        if tail.len() == STDERR_TAIL_LINES {
                            tail.pop_front();
                        }
                        tail.push_back(line.to_string());
                    }
                }
            }));
        }

        self.process = Some(process);
        self.ready = true;

        Ok(())
    }

    async fn write(&mut self, data: &str) -> Result<()> {
        if !self.ready {
            return Err(Error::Stream("Transport not ready for writing".to_string()));
        }
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::Stream("Stdin not available".to_string()))?;
        stdin
            .write_all(data.as_bytes())
            .await
            .map_err(|e| Error::Stream(format!("Failed to write to agent: {}", e)))?;
        stdin
            .flush()
            .await
            .map_err(|e| Error::Stream(format!("Failed to write to agent: {}", e)))?;
        Ok(())
    }

    fn read_messages(
        &mut self,
    ) -> std::pin::Pin<Box<dyn futures::Stream<Item = Result<serde_json::Value>> + Send>> {
        let stdout = self.stdout.take();
        let max_buffer_size = self.max_buffer_size;

        let stream = stream! {
            let stdout = match stdout {
                Some(s) => s,
                None => {
                    yield Err(Error::Stream("Not connected".to_string()));
                    return;
                }
            };

            let mut lines = BufReader::new(stdout).lines();
            let mut json_buffer = String::new();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        // update notices and other chatter are not messages
                        if json_buffer.is_empty() && !line.starts_with('{') {
                            tracing::debug!("skipping non-JSON output: {}", line);
                            continue;
                        }
                        json_buffer.push_str(line);

                        if json_buffer.len() > max_buffer_size {
                            yield Err(Error::Stream(format!(
                                "JSON message exceeded maximum buffer size of {} bytes",
                                max_buffer_size
                            )));
                            return;
                        }

                        // A message may be split over several lines; keep
                        // accumulating until it parses.
                        match serde_json::from_str::<serde_json::Value>(&json_buffer) {
                            Ok(data) => {
                                json_buffer.clear();
                                yield Ok(data);
                            }
                            Err(_) if json_buffer.len() > line.len() => {
                                // a complete message on its own line supersedes
                                // whatever broken prefix came before it
                                if let Ok(data) = serde_json::from_str::<serde_json::Value>(line) {
                                    let stale = json_buffer.len() - line.len();
                                    tracing::debug!(
                                        "discarding unparseable output: {}",
                                        &json_buffer[..stale]
                                    );
                                    json_buffer.clear();
                                    yield Ok(data);
                                }
                            }
                            Err(_) => {}
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        yield Err(Error::Stream(format!("Failed to read from agent: {}", e)));
                        return;
                    }
                }
            }

            if !json_buffer.is_empty() {
                tracing::debug!("discarding incomplete trailing output: {}", json_buffer);
            }
        };

        Box::pin(stream)
    }

    async fn end_input(&mut self) -> Result<()> {
        drop(self.stdin.take());
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.ready = false;
        self.stdin = None;
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };
        let status = process
            .wait()
            .await
            .map_err(|e| Error::Stream(format!("Failed to wait for agent: {}", e)))?;

        if status.success() {
            return Ok(());
        }
        // stderr reaches EOF once the process is gone
        if let Some(task) = self.stderr_task.take() {
            let _ = task.await;
        }

        let code = status
            .code()
            .map_or_else(|| "a signal".to_string(), |c| format!("exit code {c}"));
        Err(Error::Stream(match self.stderr_summary() {
            Some(stderr) => format!("Agent process failed with {code}: {stderr}"),
            None => format!("Agent process failed with {code}"),
        }))
    }

    async fn close(&mut self) -> Result<()> {
        self.ready = false;
        self.stdin = None;
        self.stdout = None;
        if let Some(mut process) = self.process.take() {
            let _ = process.kill().await;
            let _ = process.wait().await;
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
