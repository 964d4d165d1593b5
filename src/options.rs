//! Session configuration and Claude CLI adapter options.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ============ Capabilities ============

/// A permission granted to an agent session.
///
/// Each capability maps to exactly one agent tool name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    DelegateToSubagent,
    ReadFile,
    SearchText,
    WebSearch,
    WebFetch,
    EditFile,
    RunShell,
}

impl Capability {
    /// Tool name understood by the Claude Code CLI.
    pub fn tool_name(self) -> &'static str {
        match self {
            Self::DelegateToSubagent => "Task",
            Self::ReadFile => "Read",
            Self::SearchText => "Grep",
            Self::WebSearch => "WebSearch",
            Self::WebFetch => "WebFetch",
            Self::EditFile => "Edit",
            Self::RunShell => "Bash",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DelegateToSubagent => write!(f, "delegate-to-subagent"),
            Self::ReadFile => write!(f, "read-file"),
            Self::SearchText => write!(f, "search-text"),
            Self::WebSearch => write!(f, "web-search"),
            Self::WebFetch => write!(f, "web-fetch"),
            Self::EditFile => write!(f, "edit-file"),
            Self::RunShell => write!(f, "run-shell"),
        }
    }
}

/// Ordered, duplicate-free set of capabilities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapabilitySet(Vec<Capability>);

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a capability unless it is already present.
    pub fn insert(&mut self, capability: Capability) -> bool {
        if self.0.contains(&capability) {
            return false;
        }
        self.0.push(capability);
        true
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[Capability] {
        &self.0
    }

    /// Tool names in grant order.
    pub fn tool_names(&self) -> Vec<&'static str> {
        self.iter().map(Capability::tool_name).collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<I: IntoIterator<Item = Capability>>(iter: I) -> Self {
        let mut set = Self::new();
        for capability in iter {
            set.insert(capability);
        }
        set
    }
}

impl<const N: usize> From<[Capability; N]> for CapabilitySet {
    fn from(capabilities: [Capability; N]) -> Self {
        capabilities.into_iter().collect()
    }
}

// ============ Setting Sources ============

/// Configuration tier the agent loads defaults from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingSource {
    User,
    Project,
    Local,
}

impl SettingSource {
    /// Default precedence: later entries override earlier ones.
    pub const DEFAULT_PRECEDENCE: [SettingSource; 3] = [Self::User, Self::Project, Self::Local];
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Project => write!(f, "project"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl FromStr for SettingSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "user" => Ok(Self::User),
            "project" => Ok(Self::Project),
            "local" => Ok(Self::Local),
            other => Err(Error::InvalidInput(format!(
                "unknown setting source '{other}' (expected user, project or local)"
            ))),
        }
    }
}

// ============ Session Configuration ============

/// Per-session configuration handed to [`Agent::open_session`](crate::agent::Agent::open_session).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub capabilities: CapabilitySet,
    pub setting_sources: Vec<SettingSource>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            capabilities: CapabilitySet::new(),
            setting_sources: SettingSource::DEFAULT_PRECEDENCE.to_vec(),
        }
    }
}

impl SessionConfig {
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::new()
    }
}

#[derive(Debug, Default)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl SessionConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
        }
    }

    pub fn capabilities(mut self, capabilities: impl Into<CapabilitySet>) -> Self {
        self.config.capabilities = capabilities.into();
        self
    }

    pub fn setting_sources(mut self, sources: impl IntoIterator<Item = SettingSource>) -> Self {
        self.config.setting_sources = sources.into_iter().collect();
        self
    }

    pub fn build(self) -> SessionConfig {
        self.config
    }
}

// ============ Claude CLI Options ============

const DEFAULT_MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Options for the Claude Code CLI adapter.
///
/// These describe *how* to reach the agent; what it may do is decided per
/// request by [`SessionConfig`].
#[derive(Debug, Clone)]
pub struct ClaudeOptions {
    pub cli_path: Option<PathBuf>,
    pub cwd: Option<PathBuf>,
    pub model: Option<String>,
    pub max_turns: Option<u32>,
    pub env: HashMap<String, String>,
    pub max_buffer_size: usize,
    pub check_version: bool,
}

impl Default for ClaudeOptions {
    fn default() -> Self {
        Self {
            cli_path: None,
            cwd: None,
            model: None,
            max_turns: None,
            env: HashMap::new(),
            max_buffer_size: DEFAULT_MAX_BUFFER_SIZE,
            check_version: true,
        }
    }
}

impl ClaudeOptions {
    pub fn builder() -> ClaudeOptionsBuilder {
        ClaudeOptionsBuilder::new()
    }
}

#[derive(Debug, Default)]
pub struct ClaudeOptionsBuilder {
    options: ClaudeOptions,
}

impl ClaudeOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: ClaudeOptions::default(),
        }
    }

    pub fn cli_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cli_path = Some(path.into());
        self
    }

    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(path.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.options.model = Some(model.into());
        self
    }

    pub fn max_turns(mut self, turns: u32) -> Self {
        self.options.max_turns = Some(turns);
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.env.insert(key.into(), value.into());
        self
    }

    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.options.max_buffer_size = size;
        self
    }

    /// Disable the `claude -v` probe run before each session.
    pub fn skip_version_check(mut self) -> Self {
        self.options.check_version = false;
        self
    }

    pub fn build(self) -> ClaudeOptions {
        self.options
    }
}
