//! Error types for attribute lookups and access checks.

use thiserror::Error;

/// Boxed error raised by caller-supplied init or assertion functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type for engine operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An attribute check or an assertion denied access.
    ///
    /// `key` is the attribute name when raised by `is_` and the action name
    /// when raised by [`Request::deny`](crate::Request::deny). `reasons` are
    /// the deny reasons recorded under that key, possibly none.
    #[error("Permission denied: {message}")]
    PermissionDenied {
        key: String,
        reasons: Vec<String>,
        message: String,
    },

    /// Failure raised by an init or assertion function, passed through as is.
    #[error(transparent)]
    Collaborator(#[from] BoxError),

    /// Layered configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] abacus_config::ConfigError),

    /// Registry or cache store lock was poisoned.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Builds a permission-denied error, joining `reasons` with `separator`.
    pub fn permission_denied(
        key: impl Into<String>,
        reasons: Vec<String>,
        separator: &str,
    ) -> Self {
        let message = reasons.join(separator);
        Error::PermissionDenied {
            key: key.into(),
            reasons,
            message,
        }
    }

    /// Wraps a collaborator failure.
    pub fn collaborator(err: impl Into<BoxError>) -> Self {
        Error::Collaborator(err.into())
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        Error::Internal(format!("{what} lock poisoned"))
    }

    /// Returns whether this is the access-denied signal.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Error::PermissionDenied { .. })
    }

    /// Deny reasons carried by a permission-denied error; empty otherwise.
    pub fn reasons(&self) -> &[String] {
        match self {
            Error::PermissionDenied { reasons, .. } => reasons,
            _ => &[],
        }
    }
}
