//! # warden-core
//!
//! The step-bounded think-act-observe loop for WARDEN agents.
//!
//! This crate provides:
//! - The trait seams (`CompletionProvider`, `CompletionStream`, `ToolGateway`)
//! - `AgentLoop`, which yields a run's events as a fused iterator
//! - The response recognizer and prompt builder the loop is made of
//! - `ScriptedProvider`, a deterministic provider for tests and demos
//!
//! ## Usage
//!
//! ```rust,ignore
//! use warden_core::{AgentLoop, ScriptedProvider};
//!
//! let agent = AgentLoop::new(Box::new(provider), Box::new(gateway)).with_max_steps(5);
//! for event in agent.run("List the files in the workspace") {
//!     println!("{event:?}");
//! }
//! ```

pub mod agent_loop;
pub mod config;
pub mod parser;
pub mod prompt;
pub mod provider;
pub mod state;
pub mod traits;

pub use agent_loop::{AgentLoop, AgentRun, RunStatus};
pub use provider::ScriptedProvider;
pub use state::AgentState;
