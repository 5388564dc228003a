//! Layered configuration loading.

use crate::{AbacusConfig, ConfigError, ConfigFiles};
use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};

/// Merges built-in defaults, config files and environment variables.
///
/// Later layers win: defaults, then the user file, `abacus.toml`,
/// `abacus.local.toml`, and finally `ABACUS_*` variables such as
/// `ABACUS_ENGINE__REASON_SEPARATOR`.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    files: ConfigFiles,
    env_prefix: String,
}

impl ConfigLoader {
    /// Loader rooted at the current directory.
    pub fn new() -> Self {
        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        Self {
            files: ConfigFiles::in_dir(cwd),
            env_prefix: "ABACUS".to_string(),
        }
    }

    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.files = self.files.with_project_dir(dir);
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn without_user_config(mut self) -> Self {
        self.files = self.files.without_user();
        self
    }

    pub fn files(&self) -> &ConfigFiles {
        &self.files
    }

    pub fn load(&self) -> Result<AbacusConfig, ConfigError> {
        let defaults = Config::try_from(&AbacusConfig::default())?;

        let builder = self
            .files
            .existing()
            .fold(Config::builder().add_source(defaults), |builder, path| {
                builder.add_source(File::from(path).format(FileFormat::Toml))
            })
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Ok(builder.build()?.try_deserialize()?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
