//! The tool capability contract.
//!
//! A tool is a declarative descriptor (name, description, input schema, kind)
//! plus an executor. Tools are implemented outside the loop and reached only
//! through the secure gateway, which validates and sandboxes arguments before
//! `execute` runs.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ToolError;

/// The closed set of capability classes a tool can belong to.
///
/// The gateway keys class-specific gates off this value; the command filter
/// runs only for `Process` tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolKind {
    /// Reads or writes the file system under the sandbox root.
    FileSystem,
    /// Spawns an operating system process from a command string.
    Process,
    /// Anything else; no class-specific gate applies.
    General,
}

/// Execution context handed to a tool by the gateway.
#[derive(Debug, Clone, Copy)]
pub struct ToolContext<'a> {
    /// The sandbox root every `path` argument was checked against.
    pub work_dir: &'a Path,
}

impl<'a> ToolContext<'a> {
    pub fn new(work_dir: &'a Path) -> Self {
        Self { work_dir }
    }

    /// Resolve a gateway-approved path argument against the sandbox root.
    ///
    /// Absolute paths are returned as-is; the gateway has already confirmed
    /// they fall under the root.
    pub fn resolve(&self, path: &str) -> PathBuf {
        self.work_dir.join(path)
    }
}

/// What the model is told about a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// A capability the agent can invoke.
///
/// # Contract
///
/// - `name()` is the unique registry key the model uses in its action tag.
/// - `input_schema()` is a JSON Schema document; the gateway validates raw
///   arguments against it before `execute` is ever called.
/// - `execute()` receives only validated, sandboxed arguments. Expected
///   failures (missing file, non-zero exit) are reported as an `Ok` string.
///   `Err` is reserved for unexpected faults, which the gateway contains.
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    /// Human-readable description shown to the model. Never executed.
    fn description(&self) -> &str;

    fn input_schema(&self) -> Value;

    fn kind(&self) -> ToolKind {
        ToolKind::General
    }

    /// Run the tool and return its observation.
    fn execute(&self, args: &Value, ctx: &ToolContext<'_>) -> Result<String, ToolError>;

    fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}
