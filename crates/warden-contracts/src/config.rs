//! Runtime configuration.
//!
//! Every field has a default, so a config file may set any subset of keys:
//!
//! ```toml
//! work_dir = "/srv/agent/workspace"
//! max_steps = 20
//! shell_timeout_secs = 60
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default number of model round-trips per run.
pub const DEFAULT_MAX_STEPS: usize = 10;

/// Default wall-clock limit for `run_shell_command`, in seconds.
pub const DEFAULT_SHELL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Sandbox root. Every `path` argument must resolve inside it.
    pub work_dir: PathBuf,
    /// Upper bound on model round-trips per run.
    pub max_steps: usize,
    /// Timeout applied to each shell command.
    pub shell_timeout_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("."),
            max_steps: DEFAULT_MAX_STEPS,
            shell_timeout_secs: DEFAULT_SHELL_TIMEOUT_SECS,
        }
    }
}
