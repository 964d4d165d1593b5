//! Lena CLI binary entry point.

use anyhow::{Context, Result};
use clap::Parser;
use lena::{ClaudeAgent, ClaudeOptions, Dispatcher, Menu, SettingSource};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt};

/// Run predefined Lena tasks through the Claude Code agent.
#[derive(Debug, Parser)]
#[command(name = "lena", version, about)]
struct Cli {
    /// Path to the `claude` executable
    #[arg(long, env = "LENA_CLI_PATH")]
    cli_path: Option<PathBuf>,

    /// Working directory for the agent
    #[arg(long, env = "LENA_CWD")]
    cwd: Option<PathBuf>,

    /// Model to request from the agent
    #[arg(long, env = "LENA_MODEL")]
    model: Option<String>,

    /// Maximum agent turns per task
    #[arg(long)]
    max_turns: Option<u32>,

    /// Abort a task after this many seconds
    #[arg(long, env = "LENA_TIMEOUT", value_name = "SECS")]
    timeout: Option<u64>,

    /// Setting sources in precedence order, later entries win
    #[arg(long, value_delimiter = ',', default_value = "user,project,local")]
    setting_sources: Vec<String>,

    /// Verbosity level (use -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn init_tracing(&self) {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let directive = match self.verbose {
                0 => "warn",
                1 => "lena=info",
                2 => "lena=debug",
                _ => "trace",
            };
            EnvFilter::new(directive)
        });

        fmt()
            .without_time()
            .with_env_filter(filter)
            .with_target(self.verbose != 0)
            .with_writer(std::io::stderr)
            .init();
    }

    fn claude_options(&self) -> ClaudeOptions {
        let mut builder = ClaudeOptions::builder();
        if let Some(ref path) = self.cli_path {
            builder = builder.cli_path(path);
        }
        if let Some(ref cwd) = self.cwd {
            builder = builder.cwd(cwd);
        }
        if let Some(ref model) = self.model {
            builder = builder.model(model);
        }
        if let Some(turns) = self.max_turns {
            builder = builder.max_turns(turns);
        }
        builder.build()
    }

    fn setting_sources(&self) -> Result<Vec<SettingSource>> {
        self.setting_sources
            .iter()
            .map(|s| s.parse::<SettingSource>().map_err(anyhow::Error::from))
            .collect()
    }
}

/// Resolves when `signal` fires. Never resolves if the handler could not be
/// installed, so the request keeps running instead of being cancelled.
async fn interrupted<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(e) = signal.await {
        tracing::warn!("cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.init_tracing();

    let mut dispatcher = Dispatcher::new(ClaudeAgent::new(cli.claude_options()))
        .with_setting_sources(cli.setting_sources().context("invalid --setting-sources")?);
    if let Some(secs) = cli.timeout {
        dispatcher = dispatcher.with_timeout(Duration::from_secs(secs));
    }

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();

    Menu::new(&dispatcher)
        .run(stdin, &mut stdout, || interrupted(tokio::signal::ctrl_c()))
        .await?;

    Ok(())
}
