//! TOML loading for `AgentConfig`.

use std::path::Path;

use warden_contracts::{
    config::AgentConfig,
    error::{WardenError, WardenResult},
};

/// Parse `s` as a TOML `AgentConfig`. Missing keys take their defaults.
pub fn load_config_str(s: &str) -> WardenResult<AgentConfig> {
    toml::from_str(s).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to parse agent config TOML: {}", e),
    })
}

/// Read and parse the config file at `path`.
pub fn load_config(path: &Path) -> WardenResult<AgentConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| WardenError::ConfigError {
        reason: format!("failed to read config file '{}': {}", path.display(), e),
    })?;
    load_config_str(&contents)
}
