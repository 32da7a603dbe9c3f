//! Run identity, actions, and history steps.
//!
//! These types carry model intent through the loop. An `Action` is built from
//! untrusted model text; nothing here validates it. The gateway does that.

use serde::{Deserialize, Serialize};

/// Unique identifier for a single agent run.
///
/// Appears in every log line the loop emits for that run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub uuid::Uuid);

impl RunId {
    /// Create a new, unique run ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A tool invocation chosen by the model.
///
/// `args` is whatever JSON the model wrote inside the action tag. It is
/// untyped until the gateway validates it against the tool's input schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    /// Registry key of the requested tool.
    pub tool_name: String,
    /// Raw arguments as parsed from the model's JSON blob.
    pub args: serde_json::Value,
}

impl Action {
    pub fn new(tool_name: impl Into<String>, args: serde_json::Value) -> Self {
        Self { tool_name: tool_name.into(), args }
    }
}

/// One completed think-act-observe cycle.
///
/// Steps are immutable once recorded; the history only ever grows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// The model's reasoning, or the fixed sentinel when it gave none.
    pub thought: String,
    /// The action that was dispatched.
    pub action: Action,
    /// The gateway's textual result, success or failure alike.
    pub observation: String,
}
