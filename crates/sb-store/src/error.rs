use sb_types::StorageKey;

/// Errors from blob store and snapshot slot operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing store could not be opened or is offline.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Stored bytes for a key cannot be decoded.
    #[error("corrupt blob {key}: {reason}")]
    Corrupt { key: StorageKey, reason: String },

    /// An inline (data URL) payload is malformed.
    #[error("invalid inline content: {0}")]
    InvalidInline(String),

    /// A lock guarding in-memory state was poisoned.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
