//! Trait seams between the loop and its collaborators.
//!
//! - `CompletionProvider` / `CompletionStream`: untrusted text generation
//! - `ToolGateway`: the trusted boundary between model intent and tools
//!
//! The loop never calls a tool directly. Every action it parses goes through
//! `ToolGateway::dispatch`, which validates, sandboxes, filters, and contains
//! faults before anything touches the system.

use warden_contracts::{agent::Action, error::WardenResult, tool::ToolSummary};

/// An external text-generation service.
///
/// The provider is not assumed to enforce the response grammar; the rendered
/// instruction text alone encodes it.
pub trait CompletionProvider: Send + Sync {
    /// Start a completion for `instruction` and return its fragment stream.
    fn complete(&self, instruction: &str) -> WardenResult<Box<dyn CompletionStream>>;
}

/// One in-flight completion.
///
/// Fragments are consumed incrementally with `next_fragment` until it returns
/// `None`. Only then is `full_text` called to obtain the aggregated response;
/// the loop never parses partial output because tags may straddle fragments.
pub trait CompletionStream: Send {
    /// The next text fragment, `None` at end of stream.
    fn next_fragment(&mut self) -> Option<WardenResult<String>>;

    /// The aggregated response. Called once, after end of stream.
    fn full_text(&mut self) -> WardenResult<String>;
}

/// The only path from a model-chosen action to a system-affecting tool.
///
/// Implementations must be total: `dispatch` always returns an observation
/// string and never panics or errors, whichever gate rejected the call or
/// whatever the tool did.
pub trait ToolGateway: Send + Sync {
    /// Run `action` through every gate and return the observation.
    fn dispatch(&self, action: &Action) -> String;

    /// Describe the tools reachable through this gateway, for the prompt.
    fn catalog(&self) -> Vec<ToolSummary>;
}
