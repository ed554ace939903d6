//! Flow errors

use std::path::PathBuf;

use flow_env::ResolveError;

use crate::config::OverrideError;

/// Errors from building or querying flow definitions and flow configs.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error("invalid flow definition {origin}: {reason}")]
    Definition { origin: String, reason: String },

    #[error("stage `{0}` is not defined")]
    UnknownStage(String),

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

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Result type for flow operations
pub type FlowResult<T> = Result<T, FlowError>;
