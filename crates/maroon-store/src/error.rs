use maroon_types::ContentHash;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ContentHash),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {hash}: computed {computed}")]
    HashMismatch {
        hash: ContentHash,
        computed: ContentHash,
    },

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {hash}: {reason}")]
    CorruptObject { hash: ContentHash, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
