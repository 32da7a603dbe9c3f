//! # warden-tools
//!
//! The built-in tools shipped with the WARDEN runtime.
//!
//! | Tool                | Kind         | Arguments          |
//! |---------------------|--------------|--------------------|
//! | `read_file`         | `FileSystem` | `path`             |
//! | `write_file`        | `FileSystem` | `path`, `content`  |
//! | `list_files`        | `FileSystem` | `path`             |
//! | `run_shell_command` | `Process`    | `command`          |
//!
//! None of these tools performs its own sandboxing. They are meant to be
//! reached only through `warden_gateway::SecureGateway`.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use warden_contracts::{
    config::AgentConfig,
    error::{ToolError, WardenResult},
    tool::Tool,
};
use warden_gateway::ToolRegistry;

pub mod fs;
pub mod shell;

pub use fs::{ListFiles, ReadFile, WriteFile};
pub use shell::RunShellCommand;

/// Every built-in tool, in catalogue order.
pub fn builtin_tools(config: &AgentConfig) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ReadFile),
        Arc::new(WriteFile),
        Arc::new(ListFiles),
        Arc::new(RunShellCommand::new(Duration::from_secs(config.shell_timeout_secs))),
    ]
}

/// A registry holding exactly the built-in tools.
pub fn default_registry(config: &AgentConfig) -> WardenResult<ToolRegistry> {
    ToolRegistry::new(builtin_tools(config))
}

/// Fetch a required string argument.
///
/// The gateway has already validated `args` against the tool's schema, so a
/// miss here means the tool was called around the gateway.
pub(crate) fn str_arg<'a>(args: &'a Value, name: &str) -> Result<&'a str, ToolError> {
    args.get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::failed(format!("missing string argument '{name}'")))
}
