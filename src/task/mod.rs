//! Task kinds and task requests.
//!
//! Every kind is described by a static table row: its parameters, the
//! instruction template, the capabilities it may use and the text the menu
//! shows around it. The dispatcher only ever reads these rows.

pub mod templates;

use crate::error::{Error, Result};
use crate::options::{Capability, CapabilitySet};
use std::collections::BTreeMap;
use std::fmt;

/// A named input required by a task kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    /// Prompt shown by the interactive menu.
    pub label: &'static str,
}

/// The four supported tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// Audit one file for security and quality.
    Verify,
    /// Compare two implementations.
    Compare,
    /// Research an error and fix it in place.
    SearchFix,
    /// Project-wide security audit.
    Audit,
}

impl TaskKind {
    pub const ALL: [TaskKind; 4] = [Self::Verify, Self::Compare, Self::SearchFix, Self::Audit];

    pub fn title(self) -> &'static str {
        match self {
            Self::Verify => "Verify a code file",
            Self::Compare => "Compare two implementations",
            Self::SearchFix => "Search for and fix an error",
            Self::Audit => "Full security audit",
        }
    }

    pub fn params(self) -> &'static [ParamSpec] {
        match self {
            Self::Verify => &[ParamSpec {
                name: "file",
                label: "File to verify",
            }],
            Self::Compare => &[
                ParamSpec {
                    name: "file1",
                    label: "First file",
                },
                ParamSpec {
                    name: "file2",
                    label: "Second file",
                },
            ],
            Self::SearchFix => &[
                ParamSpec {
                    name: "error_message",
                    label: "Error message",
                },
                ParamSpec {
                    name: "file_path",
                    label: "Affected file",
                },
            ],
            Self::Audit => &[],
        }
    }

    pub fn template(self) -> &'static str {
        match self {
            Self::Verify => templates::VERIFY,
            Self::Compare => templates::COMPARE,
            Self::SearchFix => templates::SEARCH_FIX,
            Self::Audit => templates::AUDIT,
        }
    }

    /// The exact capability set granted to sessions for this kind.
    pub fn capabilities(self) -> CapabilitySet {
        use Capability::*;
        match self {
            Self::Verify => CapabilitySet::from([DelegateToSubagent]),
            Self::Compare => CapabilitySet::from([DelegateToSubagent, ReadFile, SearchText]),
            Self::SearchFix => CapabilitySet::from([
                DelegateToSubagent,
                WebSearch,
                WebFetch,
                ReadFile,
                EditFile,
            ]),
            Self::Audit => CapabilitySet::from([DelegateToSubagent, RunShell, SearchText, ReadFile]),
        }
    }

    /// Line printed before the request is dispatched.
    fn banner_template(self) -> &'static str {
        match self {
            Self::Verify => "🔍 Verifying {file} with Lena...",
            Self::Compare => "⚖️  Comparing {file1} vs {file2} with Lena...",
            Self::SearchFix => "🚨 Searching for a fix for the error in {file_path}...",
            Self::Audit => "🔐 Security audit with Lena...",
        }
    }

    pub fn results_heading(self) -> &'static str {
        match self {
            Self::Verify => "📋 Lena's findings:",
            Self::Compare => "📊 Comparison report:",
            Self::SearchFix => "🔧 Proposed fix:",
            Self::Audit => "🛡️ Security report:",
        }
    }

    /// Whether incremental assistant content is shown, or only the final result.
    pub fn echo_partials(self) -> bool {
        matches!(self, Self::Verify)
    }

    /// Menu number for this kind, starting at 1.
    pub fn menu_number(self) -> usize {
        match self {
            Self::Verify => 1,
            Self::Compare => 2,
            Self::SearchFix => 3,
            Self::Audit => 4,
        }
    }

    pub fn from_menu_choice(choice: &str) -> Option<Self> {
        let n: usize = choice.trim().parse().ok()?;
        Self::ALL.into_iter().find(|k| k.menu_number() == n)
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Verify => write!(f, "verify"),
            Self::Compare => write!(f, "compare"),
            Self::SearchFix => write!(f, "search-fix"),
            Self::Audit => write!(f, "audit"),
        }
    }
}

/// A task kind plus its named parameters.
///
/// Immutable once built; call [`TaskRequest::render`] to validate it and
/// produce the instruction text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    kind: TaskKind,
    params: BTreeMap<String, String>,
}

impl TaskRequest {
    pub fn builder(kind: TaskKind) -> TaskRequestBuilder {
        TaskRequestBuilder {
            kind,
            params: BTreeMap::new(),
        }
    }

    pub fn new<K, V>(kind: TaskKind, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            kind,
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &BTreeMap<String, String> {
        &self.params
    }

    /// Check that every required parameter is present and non-blank, and
    /// that no parameter is unknown to the task kind.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        let specs = self.kind.params();

        for spec in specs {
            match self.params.get(spec.name) {
                None => {
                    return Err(Error::InvalidInput(format!(
                        "missing required parameter '{}' for {} task",
                        spec.name, self.kind
                    )));
                }
                Some(value) if value.trim().is_empty() => {
                    return Err(Error::InvalidInput(format!(
                        "parameter '{}' for {} task must not be empty",
                        spec.name, self.kind
                    )));
                }
                Some(_) => {}
            }
        }

        if let Some(unknown) = self
            .params
            .keys()
            .find(|name| !specs.iter().any(|s| s.name == name.as_str()))
        {
            return Err(Error::InvalidInput(format!(
                "unknown parameter '{}' for {} task",
                unknown, self.kind
            )));
        }

        Ok(())
    }

    /// Validate and render the instruction text for this request.
    pub fn render(&self) -> Result<String> {
        self.validate()?;
        Ok(templates::render(self.kind.template(), &self.params))
    }

    /// Banner line for the menu. Missing parameters are left as placeholders.
    pub fn banner(&self) -> String {
        templates::render(self.kind.banner_template(), &self.params)
    }
}

/// Builder for [`TaskRequest`].
#[derive(Debug, Clone)]
pub struct TaskRequestBuilder {
    kind: TaskKind,
    params: BTreeMap<String, String>,
}

impl TaskRequestBuilder {
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn build(self) -> TaskRequest {
        TaskRequest {
            kind: self.kind,
            params: self.params,
        }
    }
}
