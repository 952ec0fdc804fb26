//! Error types for enforcer-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading policy documents.
#[derive(Debug, Error)]
pub enum PolicyError {
    /// Underlying I/O failure while reading a policy file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON parse error on load; includes file path and line context from serde_json.
    #[error("failed to parse policy at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The policy file did not exist at the expected path.
    #[error("policy not found at {path}")]
    PolicyNotFound { path: PathBuf },

    /// The configured policy directory is missing or not a directory.
    #[error("policy directory {path} does not exist or is not a directory")]
    PolicyDirMissing { path: PathBuf },
}

/// A policy or CLI value that is not one of the accepted spellings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} '{value}'; expected one of: {expected}")]
pub struct InvalidValue {
    pub kind: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// A repository full name that is not of the form `owner/slug`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository name '{0}'; expected 'owner/slug'")]
pub struct InvalidRepositoryName(pub String);

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PolicyError {
    PolicyError::Io {
        path: path.into(),
        source,
    }
}
