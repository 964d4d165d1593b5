//! Claude CLI command builder.
//!
//! Translates [`ClaudeOptions`] and a [`SessionConfig`] into CLI arguments
//! for the Claude Code binary.

use crate::options::{ClaudeOptions, SessionConfig};

/// Build the full command-line arguments for invoking the Claude CLI.
///
/// The first element is the CLI path itself; remaining elements are flags/values.
/// Only the tools in `config.capabilities` are passed as `--allowedTools`.
pub fn build_command(cli_path: &str, options: &ClaudeOptions, config: &SessionConfig) -> Vec<String> {
    let mut cmd = vec![
        cli_path.to_string(),
        "--output-format".to_string(),
        "stream-json".to_string(),
        "--verbose".to_string(),
        "--system-prompt".to_string(),
        String::new(),
    ];

    if !config.capabilities.is_empty() {
        cmd.push("--allowedTools".to_string());
        cmd.push(config.capabilities.tool_names().join(","));
    }
    if let Some(t) = options.max_turns {
        cmd.push("--max-turns".to_string());
        cmd.push(t.to_string());
    }
    if let Some(ref m) = options.model {
        cmd.push("--model".to_string());
        cmd.push(m.clone());
    }

    let sources: Vec<String> = config
        .setting_sources
        .iter()
        .map(|s| s.to_string())
        .collect();
    cmd.push("--setting-sources".to_string());
    cmd.push(sources.join(","));

    cmd.push("--input-format".to_string());
    cmd.push("stream-json".to_string());

    cmd
}

/// One stream-json user message carrying `instruction`, newline terminated.
pub fn user_message_line(instruction: &str) -> String {
    let message = serde_json::json!({
        "type": "user",
        "message": {"role": "user", "content": instruction},
        "parent_tool_use_id": null,
        "session_id": "default"
    });
    format!("{message}\n")
}
