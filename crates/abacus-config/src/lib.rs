//! Configuration management for Abacus
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (ABACUS_* prefix, highest precedence)
//! 2. abacus.local.toml (gitignored, local overrides)
//! 3. abacus.toml (git-tracked, project config)
//! 4. ~/.config/abacus/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)

use serde::{Deserialize, Serialize};
use std::path::Path;

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{ConfigFiles, LOCAL_FILE, PROJECT_FILE, user_config_file};

/// Main Abacus configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbacusConfig {
    pub engine: EngineConfig,
}

/// Settings for the assertion engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Emit a log record for every grant and denial.
    pub audit: bool,
    /// Joins deny reasons into the permission-denied message.
    pub reason_separator: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audit: true,
            reason_separator: "; ".to_string(),
        }
    }
}

impl AbacusConfig {
    /// Layered configuration for `project_dir`, including the user file and
    /// `ABACUS_*` variables.
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parse a single TOML document, without layering.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
