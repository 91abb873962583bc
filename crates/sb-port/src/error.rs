use thiserror::Error;

#[derive(Debug, Error)]
pub enum PortError {
    /// The document cannot be imported; nothing was changed.
    #[error("malformed portable document: {0}")]
    Malformed(String),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] sb_snapshot::SnapshotError),

    #[error("store error: {0}")]
    Store(#[from] sb_store::StoreError),
}

pub type PortResult<T> = Result<T, PortError>;
