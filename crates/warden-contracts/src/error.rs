//! Error types for the WARDEN runtime.
//!
//! Only `DuplicateTool` and `ConfigError` ever surface as hard failures, and
//! only at construction time. Every other variant is rendered into a terminal
//! `error` event by the loop.

use thiserror::Error;

/// The unified error type for the WARDEN runtime.
#[derive(Debug, Error)]
pub enum WardenError {
    /// Two tool descriptors share a name. Fatal at registry construction.
    #[error("duplicate tool name detected: '{name}'. Tool names must be unique.")]
    DuplicateTool { name: String },

    /// A configuration file is unreadable or malformed.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// The completion provider failed to start or interrupted its stream.
    #[error("completion provider failed: {reason}")]
    Provider { reason: String },

    /// An action tag was found but its argument blob is not valid JSON.
    #[error("Failed to parse action args JSON: {reason}")]
    InvalidArgs { reason: String },

    /// The response carried neither an action nor a finish directive.
    #[error("LLM response did not contain a valid <action> or <finish> tag.")]
    MissingDirective,

    /// The run used every step of its budget without finishing.
    #[error("Agent stopped after reaching the maximum of {max_steps} steps.")]
    StepBudgetExceeded { max_steps: usize },
}

/// Convenience alias used throughout the WARDEN crates.
pub type WardenResult<T> = Result<T, WardenError>;

/// An unexpected fault raised by a tool executor.
///
/// Expected failures are returned as observation strings instead; this type
/// covers what the tool could not anticipate. The gateway converts it into an
/// observation and never lets it propagate.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{reason}")]
    Failed { reason: String },
}

impl ToolError {
    pub fn failed(reason: impl Into<String>) -> Self {
        ToolError::Failed { reason: reason.into() }
    }
}
