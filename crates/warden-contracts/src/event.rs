//! The event protocol a run emits to its consumer.
//!
//! Events are totally ordered by emission. `Finish` and `Error` are terminal:
//! exactly one of them closes every run, and nothing follows it.

use serde::{Deserialize, Serialize};

use crate::agent::Action;

/// A single event in a run's output sequence.
///
/// Serializes with an internal `type` tag, e.g.
/// `{"type":"tool-call","action":{"toolName":"read_file","args":{..}}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum AgentEvent {
    /// An incremental fragment of model output, forwarded as it arrives.
    TextDelta { delta: String },

    /// The parsed thought for the current step.
    Thought { thought: String },

    /// The action about to be dispatched through the gateway.
    ToolCall { action: Action },

    /// The gateway's result for the preceding tool call.
    ToolOutput { observation: String },

    /// Terminal: the model declared the goal complete.
    Finish { result: String },

    /// Terminal: the run stopped on a parse failure, provider failure, or
    /// exhausted step budget.
    Error { message: String },
}

impl AgentEvent {
    /// Return true for `Finish` and `Error`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentEvent::Finish { .. } | AgentEvent::Error { .. })
    }

    /// The kebab-case discriminant, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            AgentEvent::TextDelta { .. } => "text-delta",
            AgentEvent::Thought { .. } => "thought",
            AgentEvent::ToolCall { .. } => "tool-call",
            AgentEvent::ToolOutput { .. } => "tool-output",
            AgentEvent::Finish { .. } => "finish",
            AgentEvent::Error { .. } => "error",
        }
    }
}
