//! Error types for the project configuration.

use std::path::PathBuf;

use super::scope::SlotKind;

/// Errors from override slot operations.
///
/// These are expected user-input mistakes: every operation that returns one
/// has left the document untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OverrideError {
    #[error("scope `{0}` does not exist")]
    ScopeNotFound(String),

    #[error("scope `{scope}` has a `{key}` entry that is not a map")]
    MalformedScope { scope: String, key: String },

    #[error("platform `{0}` already exists or is a reserved keyword")]
    AlreadyExists(String),

    #[error("{} `{name}` is not a list", .kind.noun())]
    NotAList { kind: SlotKind, name: String },

    #[error("{} `{name}` is not set", .kind.noun())]
    NotSet { kind: SlotKind, name: String },

    #[error("index list is empty")]
    EmptyIndexList,

    #[error("index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Errors from loading or saving a project document.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse error in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot serialize document for {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}: document root is not a map")]
    NotAnObject(PathBuf),

    #[error("{0} was modified on disk since it was loaded")]
    ModifiedOnDisk(PathBuf),

    #[error("project has no file path to save to")]
    NoPath,

    #[error(transparent)]
    Override(#[from] OverrideError),
}
