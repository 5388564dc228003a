//! Where configuration files are looked up.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Project-level file, usually checked in.
pub const PROJECT_FILE: &str = "abacus.toml";

/// Per-checkout overrides, usually gitignored.
pub const LOCAL_FILE: &str = "abacus.local.toml";

/// `<platform config dir>/abacus/config.toml`, if the platform has one.
pub fn user_config_file() -> Option<PathBuf> {
    ProjectDirs::from("dev", "Abacus", "abacus").map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Candidate configuration files for one project, lowest precedence first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFiles {
    user: Option<PathBuf>,
    project: PathBuf,
    local: PathBuf,
}

impl ConfigFiles {
    /// Files for `project_dir`, plus the user file when one can be located.
    pub fn in_dir(project_dir: impl AsRef<Path>) -> Self {
        let dir = project_dir.as_ref();
        Self {
            user: user_config_file(),
            project: dir.join(PROJECT_FILE),
            local: dir.join(LOCAL_FILE),
        }
    }

    /// Points the project and local files at another directory.
    pub fn with_project_dir(self, project_dir: impl AsRef<Path>) -> Self {
        Self {
            user: self.user,
            ..Self::in_dir(project_dir)
        }
    }

    /// Drops the user file from the candidates.
    pub fn without_user(mut self) -> Self {
        self.user = None;
        self
    }

    pub fn user(&self) -> Option<&Path> {
        self.user.as_deref()
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    pub fn local(&self) -> &Path {
        &self.local
    }

    /// Candidates that exist on disk, lowest precedence first.
    pub fn existing(&self) -> impl Iterator<Item = &Path> {
        self.user
            .as_deref()
            .into_iter()
            .chain([self.project.as_path(), self.local.as_path()])
            .filter(|path| path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_user_file_name() {
        if let Some(file) = user_config_file() {
            assert!(file.to_string_lossy().contains("abacus"));
            assert!(file.ends_with("config.toml"));
        }
    }

    #[test]
    fn test_existing_in_precedence_order() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let files = ConfigFiles::in_dir(temp_dir.path()).without_user();
        assert_eq!(files.existing().count(), 0);

        fs::write(files.local(), "").expect("Failed to write local config");
        fs::write(files.project(), "").expect("Failed to write project config");

        let found: Vec<&Path> = files.existing().collect();
        assert_eq!(found, vec![files.project(), files.local()]);
        assert_eq!(files.project(), temp_dir.path().join(PROJECT_FILE));
    }

    #[test]
    fn test_moving_project_dir_keeps_user_choice() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let files = ConfigFiles::in_dir(".")
            .without_user()
            .with_project_dir(temp_dir.path());

        assert_eq!(files.user(), None);
        assert_eq!(files.local(), temp_dir.path().join(LOCAL_FILE));
    }
}
