//! Lena task dispatcher
//!
//! Drives the Claude Code agent with a small set of predefined prompt
//! templates (code verification, comparison, error search-and-fix and a
//! security audit), each delegated to the `lena` sub-agent with the
//! minimum tool set the task needs.
//!
//! # Examples
//!
//! ```
//! use lena::{Capability, TaskKind, TaskRequest};
//!
//! let request = TaskRequest::builder(TaskKind::Verify)
//!     .param("file", "app.py")
//!     .build();
//! let instruction = request.render().unwrap();
//! assert!(instruction.contains("app.py"));
//!
//! let caps = TaskKind::Verify.capabilities();
//! assert_eq!(caps.as_slice(), &[Capability::DelegateToSubagent]);
//! ```

pub mod agent;
pub mod dispatcher;
pub mod error;
pub mod menu;
pub mod options;
pub mod task;
pub mod transport;
pub mod types;

// Primary exports
pub use agent::claude::ClaudeAgent;
pub use agent::claude::message_parser::parse_message;
pub use agent::{Agent, AgentSession};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use menu::Menu;
pub use options::{
    Capability, CapabilitySet, ClaudeOptions, ClaudeOptionsBuilder, SessionConfig,
    SessionConfigBuilder, SettingSource,
};
pub use task::{ParamSpec, TaskKind, TaskRequest, TaskRequestBuilder};
pub use types::{ResponseStream, ResponseUnit};

/// One-shot dispatch through the Claude Code CLI with default options.
///
/// The returned stream owns its dispatcher, so it can outlive the call.
pub fn run(request: TaskRequest, options: Option<ClaudeOptions>) -> ResponseStream<'static> {
    let dispatcher = Dispatcher::new(ClaudeAgent::new(options.unwrap_or_default()));
    Box::pin(async_stream::stream! {
        use futures::StreamExt;
        let mut units = dispatcher.run(&request);
        while let Some(unit) = units.next().await {
            yield unit;
        }
    })
}
