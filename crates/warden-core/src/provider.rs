//! A deterministic completion provider that replays canned responses.
//!
//! `ScriptedProvider` backs the loop's tests and the demo CLI. Each call to
//! `complete` pops the next scripted response and streams it back in
//! fixed-size fragments, so tags can be made to straddle fragment boundaries.

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::debug;

use warden_contracts::error::{WardenError, WardenResult};

use crate::traits::{CompletionProvider, CompletionStream};

/// Script separator: a line containing only `---`.
pub const SCRIPT_SEPARATOR: &str = "---";

const DEFAULT_CHUNK_CHARS: usize = 16;

struct Script {
    responses: VecDeque<String>,
    /// Replayed forever once `responses` runs dry.
    fallback: Option<String>,
    /// Every instruction received, in order.
    instructions: Vec<String>,
}

/// Replays a fixed list of responses, one per `complete` call.
pub struct ScriptedProvider {
    script: Mutex<Script>,
    chunk_chars: usize,
}

impl ScriptedProvider {
    /// Replay `responses` in order; once exhausted, `complete` fails.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(responses.into_iter().map(Into::into).collect(), None)
    }

    /// Return `response` on every call.
    pub fn repeating(response: impl Into<String>) -> Self {
        Self::build(VecDeque::new(), Some(response.into()))
    }

    /// Parse a script file body: responses separated by `---` lines.
    ///
    /// Blank responses (e.g. from a trailing separator) are dropped.
    pub fn from_script(script: &str) -> Self {
        let mut responses = Vec::new();
        let mut current = Vec::new();
        for line in script.lines() {
            if line.trim() == SCRIPT_SEPARATOR {
                responses.push(current.join("\n"));
                current.clear();
            } else {
                current.push(line);
            }
        }
        responses.push(current.join("\n"));
        Self::new(responses.into_iter().filter(|r| !r.trim().is_empty()))
    }

    /// Stream responses in fragments of at most `chars` characters.
    pub fn with_chunk_chars(mut self, chars: usize) -> Self {
        self.chunk_chars = chars.max(1);
        self
    }

    /// Instructions received so far.
    pub fn instructions(&self) -> Vec<String> {
        self.script.lock().expect("script lock poisoned").instructions.clone()
    }

    /// Number of scripted responses not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.lock().expect("script lock poisoned").responses.len()
    }

    fn build(responses: VecDeque<String>, fallback: Option<String>) -> Self {
        Self {
            script: Mutex::new(Script { responses, fallback, instructions: Vec::new() }),
            chunk_chars: DEFAULT_CHUNK_CHARS,
        }
    }
}

impl CompletionProvider for ScriptedProvider {
    fn complete(&self, instruction: &str) -> WardenResult<Box<dyn CompletionStream>> {
        let mut script = self.script.lock().map_err(|e| WardenError::Provider {
            reason: format!("script lock poisoned: {e}"),
        })?;
        script.instructions.push(instruction.to_string());

        let response = match script.responses.pop_front() {
            Some(response) => response,
            None => script.fallback.clone().ok_or_else(|| WardenError::Provider {
                reason: "scripted responses exhausted".to_string(),
            })?,
        };

        debug!(
            response_chars = response.chars().count(),
            remaining = script.responses.len(),
            "replaying scripted response"
        );
        Ok(Box::new(BufferedStream::new(response, self.chunk_chars)))
    }
}

/// A completion whose full text is already known, streamed in fragments.
pub struct BufferedStream {
    fragments: VecDeque<String>,
    text: String,
}

impl BufferedStream {
    pub fn new(text: String, chunk_chars: usize) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let fragments = chars
            .chunks(chunk_chars.max(1))
            .map(|chunk| chunk.iter().collect::<String>())
            .collect();
        Self { fragments, text }
    }
}

impl CompletionStream for BufferedStream {
    fn next_fragment(&mut self) -> Option<WardenResult<String>> {
        self.fragments.pop_front().map(Ok)
    }

    fn full_text(&mut self) -> WardenResult<String> {
        Ok(std::mem::take(&mut self.text))
    }
}
