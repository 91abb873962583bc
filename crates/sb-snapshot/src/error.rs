use thiserror::Error;

/// Errors from snapshot encoding, decoding and migration.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The stored document does not parse as a snapshot.
    #[error("snapshot corrupt: {0}")]
    Corrupt(String),

    #[error("store error: {0}")]
    Store(#[from] sb_store::StoreError),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;
