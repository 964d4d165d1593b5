#![cfg(unix)]
//! End-to-end tests of the Claude CLI adapter against fake `claude` scripts.

use futures::StreamExt;
use lena::{ClaudeAgent, ClaudeOptions, Dispatcher, Error, ResponseUnit, TaskKind, TaskRequest};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

struct TempTestDir {
    path: PathBuf,
}

impl TempTestDir {
    fn new(prefix: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before UNIX_EPOCH")
            .as_nanos();
        let path = std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()));
        fs::create_dir_all(&path).expect("failed to create temp directory");
        Self { path }
    }

    fn join(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    fn write_executable_script(&self, name: &str, content: &str) -> PathBuf {
        let path = self.join(name);
        fs::write(&path, content).expect("failed to write script");
        let mut perms = fs::metadata(&path)
            .expect("failed to stat script")
            .permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("failed to chmod script");
        path
    }
}

impl Drop for TempTestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

const FAKE_CLAUDE_OK: &str = r#"#!/usr/bin/env bash
set -euo pipefail
printf '%s\n' "$@" > "$ARGS_FILE"
IFS= read -r line || true
printf '%s\n' "$line" > "$INPUT_FILE"
echo '{"type":"system","subtype":"init","tools":["Task"]}'
echo '{"type":"assistant","message":{"model":"fake","content":[{"type":"text","text":"checking"}]}}'
echo '{"type":"user","message":{"content":[{"type":"tool_result","tool_use_id":"t1","content":"ok"}]}}'
echo '{"type":"result","subtype":"success","is_error":false,"session_id":"fake-1","total_cost_usd":0.01,"result":"looks fine"}'
"#;

const FAKE_CLAUDE_FAILS: &str = r#"#!/usr/bin/env bash
cat > /dev/null
echo "Invalid API key. Please run /login" >&2
exit 3
"#;

const FAKE_CLAUDE_NO_RESULT: &str = r#"#!/usr/bin/env bash
cat > /dev/null
echo '{"type":"assistant","message":{"model":"fake","content":[{"type":"text","text":"partial"}]}}'
"#;

const FAKE_CLAUDE_NOISY: &str = r#"#!/usr/bin/env bash
cat > /dev/null
echo 'Warning: update available'
echo '{"type":"assistant","message":{"model":"fake","content":[{"type":"text","text":"checking"}]}}'
echo '{progress 40%'
echo '{"type":"result","subtype":"success","is_error":false,"result":"ok"}'
"#;

const FAKE_CLAUDE_OVERSIZED: &str = r#"#!/usr/bin/env bash
cat > /dev/null
echo '{"type":"assistant","message":{"model":"fake","content":[{"type":"text","text":"this line is much longer than sixty-four bytes"}]}}'
echo '{"type":"result","subtype":"success","is_error":false,"result":"ok"}'
"#;

const FAKE_CLAUDE_HANGS: &str = r#"#!/usr/bin/env bash
cat > /dev/null
sleep 30
"#;

fn options_for(dir: &TempTestDir, script: &str) -> ClaudeOptions {
    let cli = dir.write_executable_script("claude", script);
    ClaudeOptions::builder()
        .cli_path(cli)
        .cwd(&dir.path)
        .env("ARGS_FILE", dir.join("args.txt").to_string_lossy())
        .env("INPUT_FILE", dir.join("input.json").to_string_lossy())
        .skip_version_check()
        .build()
}

fn audit_request() -> TaskRequest {
    TaskRequest::builder(TaskKind::Audit).build()
}

#[tokio::test]
async fn test_audit_round_trip_through_fake_cli() {
    let dir = TempTestDir::new("lena-cli-ok");
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options_for(&dir, FAKE_CLAUDE_OK)));

    let units: Vec<_> = dispatcher.run(&audit_request()).collect().await;
    let units: Vec<ResponseUnit> = units.into_iter().map(|u| u.unwrap()).collect();

    assert_eq!(units.len(), 2);
    assert_eq!(units[0], ResponseUnit::partial("checking"));
    match &units[1] {
        ResponseUnit::Final {
            text,
            is_error,
            session_id,
            total_cost_usd,
        } => {
            assert_eq!(text, "looks fine");
            assert!(!is_error);
            assert_eq!(session_id.as_deref(), Some("fake-1"));
            assert_eq!(*total_cost_usd, Some(0.01));
        }
        other => panic!("expected Final, got {other:?}"),
    }

    let args: Vec<String> = fs::read_to_string(dir.join("args.txt"))
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    let value_of = |flag: &str| {
        let i = args.iter().position(|a| a == flag).expect(flag);
        args[i + 1].clone()
    };
    assert_eq!(value_of("--allowedTools"), "Task,Bash,Grep,Read");
    assert_eq!(value_of("--setting-sources"), "user,project,local");
    assert_eq!(value_of("--output-format"), "stream-json");
    assert_eq!(value_of("--input-format"), "stream-json");

    let input: serde_json::Value =
        serde_json::from_str(fs::read_to_string(dir.join("input.json")).unwrap().trim()).unwrap();
    assert_eq!(input["type"], "user");
    let content = input["message"]["content"].as_str().unwrap();
    assert!(content.contains("bandit"));
    assert!(content.contains("npm audit"));
}

#[tokio::test]
async fn test_nonzero_exit_is_stream_error_with_stderr() {
    let dir = TempTestDir::new("lena-cli-fail");
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options_for(&dir, FAKE_CLAUDE_FAILS)));

    let units: Vec<_> = dispatcher.run(&audit_request()).collect().await;
    assert_eq!(units.len(), 1);
    match &units[0] {
        Err(Error::Stream(msg)) => {
            assert!(msg.contains("exit code 3"), "{msg}");
            assert!(msg.contains("Invalid API key"), "{msg}");
        }
        other => panic!("expected stream error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_result_is_stream_error() {
    let dir = TempTestDir::new("lena-cli-noresult");
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options_for(&dir, FAKE_CLAUDE_NO_RESULT)));

    let units: Vec<_> = dispatcher.run(&audit_request()).collect().await;
    assert_eq!(units.len(), 2);
    assert!(matches!(units[0], Ok(ResponseUnit::Partial { .. })));
    assert!(matches!(units[1], Err(Error::Stream(ref m)) if m.contains("without a final result")));
}

#[tokio::test]
async fn test_non_json_output_is_skipped() {
    let dir = TempTestDir::new("lena-cli-noisy");
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options_for(&dir, FAKE_CLAUDE_NOISY)));

    let units: Vec<_> = dispatcher.run(&audit_request()).collect().await;
    let units: Vec<ResponseUnit> = units.into_iter().map(|u| u.unwrap()).collect();
    assert_eq!(units.len(), 2);
    assert_eq!(units[0], ResponseUnit::partial("checking"));
    assert!(units[1].is_final());
    assert_eq!(units[1].text(), "ok");
}

#[tokio::test]
async fn test_oversized_message_is_stream_error() {
    let dir = TempTestDir::new("lena-cli-oversized");
    let options = ClaudeOptions {
        max_buffer_size: 64,
        ..options_for(&dir, FAKE_CLAUDE_OVERSIZED)
    };
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options));

    let units: Vec<_> = dispatcher.run(&audit_request()).collect().await;
    assert_eq!(units.len(), 1);
    assert!(
        matches!(units[0], Err(Error::Stream(ref m)) if m.contains("exceeded maximum buffer size")),
        "{:?}",
        units[0]
    );
}

#[tokio::test]
async fn test_hanging_cli_times_out() {
    let dir = TempTestDir::new("lena-cli-hang");
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options_for(&dir, FAKE_CLAUDE_HANGS)))
        .with_timeout(Duration::from_millis(300));

    let units: Vec<_> = dispatcher.run(&audit_request()).collect().await;
    assert_eq!(units.len(), 1);
    assert!(matches!(units[0], Err(Error::Timeout(_))));
}

#[tokio::test]
async fn test_missing_cli_is_session_error() {
    let dir = TempTestDir::new("lena-cli-missing");
    let options = ClaudeOptions::builder()
        .cli_path(dir.join("does-not-exist"))
        .skip_version_check()
        .build();
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options));

    let units: Vec<_> = dispatcher.run(&audit_request()).collect().await;
    assert_eq!(units.len(), 1);
    assert!(matches!(units[0], Err(Error::Session(_))));
}

#[tokio::test]
async fn test_missing_working_directory_is_session_error() {
    let dir = TempTestDir::new("lena-cli-cwd");
    let cli = dir.write_executable_script("claude", FAKE_CLAUDE_OK);
    let options = ClaudeOptions::builder()
        .cli_path(cli)
        .cwd(dir.join("no-such-dir"))
        .skip_version_check()
        .build();
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options));

    let units: Vec<_> = dispatcher.run(&audit_request()).collect().await;
    assert!(matches!(units[0], Err(Error::Session(ref m)) if m.contains("Working directory")));
}
