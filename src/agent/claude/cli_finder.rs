//! Claude CLI discovery and version checking.

use crate::error::{Error, Result};
use crate::options::ClaudeOptions;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

const MINIMUM_CLAUDE_CODE_VERSION: &str = "2.0.0";

fn cli_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "claude.exe"
    } else {
        "claude"
    }
}

/// Find the Claude CLI binary path.
///
/// Search order:
/// 1. Explicit `cli_path` from options
/// 2. Bundled CLI in executable directory (`_bundled/claude`)
/// 3. PATH environment variable
/// 4. Common installation paths
///
/// # Errors
///
/// Returns [`Error::Session`] if no Claude CLI binary can be located.
pub fn find_cli(options: &ClaudeOptions) -> Result<PathBuf> {
    if let Some(ref p) = options.cli_path {
        return Ok(p.clone());
    }

    if let Some(bundled) = find_bundled_cli() {
        return Ok(bundled);
    }

    if let Some(path) = which_cli() {
        return Ok(path);
    }

    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let locations = [
        format!("{}/.npm-global/bin/claude", home),
        "/usr/local/bin/claude".to_string(),
        format!("{}/.local/bin/claude", home),
        format!("{}/node_modules/.bin/claude", home),
        format!("{}/.yarn/bin/claude", home),
        format!("{}/.claude/local/claude", home),
    ];

    locations
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists())
        .ok_or_else(|| {
            Error::Session(
                "Claude Code not found. Install with:\n  npm install -g @anthropic-ai/claude-code\n\n\
                 Or pass its location with --cli-path"
                    .to_string(),
            )
        })
}

fn find_bundled_cli() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let bundled = exe.parent()?.join("_bundled").join(cli_name());
    bundled.exists().then_some(bundled)
}

fn which_cli() -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(cli_name()))
        .find(|full| full.is_file())
}

/// Leading `x.y.z` of a `claude -v` output line.
fn parse_version(output: &str) -> Option<Vec<u32>> {
    let version = output
        .trim()
        .split(|c: char| !c.is_ascii_digit() && c != '.')
        .next()
        .filter(|s| s.contains('.'))?;
    Some(version.split('.').filter_map(|s| s.parse().ok()).collect())
}

/// Whether `output` reports a version at or above the supported minimum.
///
/// Unparseable output is treated as supported.
pub fn is_supported_version(output: &str) -> bool {
    let minimum: Vec<u32> = MINIMUM_CLAUDE_CODE_VERSION
        .split('.')
        .filter_map(|s| s.parse().ok())
        .collect();
    parse_version(output).is_none_or(|v| v >= minimum)
}

/// Check the Claude CLI version and warn if below minimum.
pub async fn check_claude_version(cli_path: &Path) {
    let output = match Command::new(cli_path)
        .arg("-v")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .output()
        .await
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("Could not probe Claude Code version: {}", e);
            return;
        }
    };

    let version_output = String::from_utf8_lossy(&output.stdout);
    if !is_supported_version(&version_output) {
        tracing::warn!(
            "Claude Code version {} is unsupported. Minimum required version is {}. \
             Some features may not work correctly.",
            version_output.trim(),
            MINIMUM_CLAUDE_CODE_VERSION
        );
    }
}
