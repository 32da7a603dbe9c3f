//! Response recognizer.
//!
//! Extracts structured intent from raw model text. The grammar has three
//! case-sensitive tags:
//!
//! ```text
//! <thought>free text</thought>                      (optional)
//! <action tool="NAME" args='JSON'></action>         (one of these two)
//! <finish>free text</finish>
//! ```
//!
//! Each tag is matched by its own small scanner rather than one pattern over
//! the whole response, so the failure modes are exactly:
//!
//! - `WardenError::InvalidArgs`: an action tag whose argument blob is not JSON
//! - `WardenError::MissingDirective`: neither an action nor a finish tag
//!
//! A finish tag wins whenever one is present, even alongside an action.

use warden_contracts::{
    agent::Action,
    error::{WardenError, WardenResult},
};

/// Substituted when the response carries no thought block.
pub const NO_THOUGHT: &str = "No thought provided.";

const THOUGHT_OPEN: &str = "<thought>";
const THOUGHT_CLOSE: &str = "</thought>";
const FINISH_OPEN: &str = "<finish>";
const FINISH_CLOSE: &str = "</finish>";
const ACTION_OPEN: &str = "<action tool=\"";
const ACTION_ARGS: &str = "\" args='";
const ACTION_CLOSE: &str = "'></action>";

/// What the model asked the loop to do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Dispatch a tool call through the gateway.
    Action(Action),
    /// Stop the run with this result.
    Finish(String),
}

/// A successfully recognized response.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    /// The thought block contents, if one was present.
    pub thought: Option<String>,
    pub directive: Directive,
}

impl ParsedResponse {
    /// The thought, or `NO_THOUGHT` when the block was absent.
    pub fn thought_or_sentinel(&self) -> &str {
        self.thought.as_deref().unwrap_or(NO_THOUGHT)
    }
}

/// Recognize `text` as a complete model response.
pub fn parse_response(text: &str) -> WardenResult<ParsedResponse> {
    let thought = delimited(text, THOUGHT_OPEN, THOUGHT_CLOSE).map(str::to_string);

    if let Some(result) = delimited(text, FINISH_OPEN, FINISH_CLOSE) {
        return Ok(ParsedResponse { thought, directive: Directive::Finish(result.to_string()) });
    }

    let Some((tool_name, raw_args)) = action_tag(text) else {
        return Err(WardenError::MissingDirective);
    };

    let args: serde_json::Value = serde_json::from_str(raw_args)
        .map_err(|e| WardenError::InvalidArgs { reason: e.to_string() })?;

    Ok(ParsedResponse { thought, directive: Directive::Action(Action::new(tool_name, args)) })
}

/// Contents between the first `open` and the first `close` after it.
fn delimited<'t>(text: &'t str, open: &str, close: &str) -> Option<&'t str> {
    let start = text.find(open)? + open.len();
    let len = text[start..].find(close)?;
    Some(&text[start..start + len])
}

/// The first well-formed action tag, as `(tool name, raw argument blob)`.
///
/// A malformed opening (empty name, missing `args='`) does not end the search;
/// scanning resumes after it.
fn action_tag(text: &str) -> Option<(&str, &str)> {
    let mut offset = 0;
    while let Some(found) = text[offset..].find(ACTION_OPEN) {
        let name_start = offset + found + ACTION_OPEN.len();
        offset = name_start;

        let rest = &text[name_start..];
        let Some(name_len) = rest.find('"') else {
            return None;
        };
        if name_len == 0 {
            continue;
        }
        let Some(after_name) = rest[name_len..].strip_prefix(ACTION_ARGS) else {
            continue;
        };
        let Some(args_len) = after_name.find(ACTION_CLOSE) else {
            continue;
        };
        return Some((&rest[..name_len], &after_name[..args_len]));
    }
    None
}
