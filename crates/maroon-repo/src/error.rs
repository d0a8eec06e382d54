use std::path::PathBuf;

use maroon_dag::DagError;
use maroon_store::StoreError;
use maroon_types::ContentHash;
use thiserror::Error;

/// Errors surfaced to the editor shell.
///
/// None of these are retried internally. `InvalidTransition` means the
/// caller broke the index contract and should be treated as a bug; the
/// rest are conditions to report to the user.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The tracked file does not exist (or the identity is empty).
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("repository already exists for {0}")]
    RepoAlreadyExists(String),

    #[error("no repository for {0}")]
    RepoNotFound(String),

    #[error("object not found: {0}")]
    ObjectNotFound(ContentHash),

    /// The persisted index could not be decompressed, parsed or validated.
    #[error("corrupt index at {}: {reason}", path.display())]
    IndexCorrupt { path: PathBuf, reason: String },

    #[error("invalid transition: {0}")]
    InvalidTransition(#[source] DagError),

    /// A hash or prefix given by the user matches no version, or several.
    #[error("unknown version: {0}")]
    UnknownVersion(String),

    #[error("store error: {0}")]
    Store(StoreError),

    /// An index could not be encoded for writing.
    #[error("index serialization failed: {0}")]
    Serialization(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<StoreError> for RepoError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(hash) => Self::ObjectNotFound(hash),
            StoreError::Io(io) => Self::Io(io),
            other => Self::Store(other),
        }
    }
}

impl From<DagError> for RepoError {
    fn from(e: DagError) -> Self {
        match e {
            e if e.is_transition() => Self::InvalidTransition(e),
            DagError::Serialization(reason) => Self::Serialization(reason),
            e => Self::IndexCorrupt {
                path: PathBuf::new(),
                reason: e.to_string(),
            },
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;
