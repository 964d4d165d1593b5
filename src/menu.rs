//! Interactive text menu.
//!
//! Reads a numbered choice, prompts for the chosen task's parameters and
//! prints the streamed results. One request runs at a time; the next
//! choice is read only after the previous stream has ended.

use crate::agent::Agent;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::task::{TaskKind, TaskRequest};
use crate::types::ResponseUnit;
use futures::StreamExt;
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const BANNER: &str = "\
╔════════════════════════════════════════════════════════════════╗
║  Lena - Ultra-Skeptical Agent - Task Dispatcher                ║
╚════════════════════════════════════════════════════════════════╝
";

/// What the user typed at the selection prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Task(TaskKind),
    Quit,
    Invalid(String),
}

pub fn parse_selection(input: &str) -> Selection {
    let input = input.trim();
    if matches!(input, "q" | "quit" | "exit") {
        return Selection::Quit;
    }
    TaskKind::from_menu_choice(input)
        .map(Selection::Task)
        .unwrap_or_else(|| Selection::Invalid(input.to_string()))
}

pub struct Menu<'a, A> {
    dispatcher: &'a Dispatcher<A>,
}

impl<'a, A: Agent> Menu<'a, A> {
    pub fn new(dispatcher: &'a Dispatcher<A>) -> Self {
        Self { dispatcher }
    }

    /// Run the menu until the user quits or `input` reaches EOF.
    ///
    /// `cancel` is called once per dispatch; the request is cancelled when
    /// the returned future resolves.
    ///
    /// Agent failures are printed and the menu continues. Only I/O errors on
    /// `input`/`output` are returned.
    pub async fn run<R, W, F, C>(&self, input: R, output: &mut W, mut cancel: F) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
        F: FnMut() -> C,
        C: Future<Output = ()> + Send + 'static,
    {
        let mut lines = input.lines();
        say(output, BANNER).await?;

        loop {
            let mut menu = String::from("\nChoose a task:\n");
            for kind in TaskKind::ALL {
                menu.push_str(&format!("{}. {}\n", kind.menu_number(), kind.title()));
            }
            menu.push_str("q. Quit\n\nYour choice (1-4): ");
            say(output, &menu).await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let kind = match parse_selection(&line) {
                Selection::Task(kind) => kind,
                Selection::Quit => break,
                Selection::Invalid(choice) => {
                    tracing::debug!("invalid menu choice: {:?}", choice);
                    say(output, "❌ Invalid choice\n").await?;
                    continue;
                }
            };

            let mut builder = TaskRequest::builder(kind);
            for spec in kind.params() {
                say(output, &format!("{}: ", spec.label)).await?;
                let Some(value) = lines.next_line().await? else {
                    return Ok(());
                };
                builder = builder.param(spec.name, value.trim());
            }

            self.dispatch(&builder.build(), output, cancel()).await?;
        }

        Ok(())
    }

    /// Run one request and print its output.
    ///
    /// Returns `Ok(false)` if the request failed or the agent reported an
    /// error result; either has already been printed.
    pub async fn dispatch<W, C>(&self, request: &TaskRequest, output: &mut W, cancel: C) -> Result<bool>
    where
        W: AsyncWrite + Unpin,
        C: Future<Output = ()> + Send + 'static,
    {
        let kind = request.kind();
        say(output, &format!("{}\n\n{}\n\n", request.banner(), kind.results_heading())).await?;

        let mut units = self.dispatcher.run_until(request, cancel);
        let mut succeeded = true;
        while let Some(unit) = units.next().await {
            match unit {
                Ok(ResponseUnit::Partial { text }) => {
                    if kind.echo_partials() {
                        say(output, &format!("{text}\n")).await?;
                    }
                }
                Ok(ResponseUnit::Final {
                    text,
                    is_error,
                    total_cost_usd,
                    ..
                }) => {
                    if is_error {
                        succeeded = false;
                        say(output, &format!("❌ {text}\n")).await?;
                    } else {
                        say(output, &format!("{text}\n")).await?;
                    }
                    if let Some(cost) = total_cost_usd {
                        say(output, &format!("\n💰 Cost: ${:.4}\n", cost)).await?;
                    }
                }
                Err(e) => {
                    say(output, &format!("❌ Error: {e}\n")).await?;
                    return Ok(false);
                }
            }
        }

        Ok(succeeded)
    }
}

async fn say<W: AsyncWrite + Unpin>(output: &mut W, text: &str) -> Result<()> {
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
