use sb_types::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BoardError {
    #[error("store error: {0}")]
    Store(#[from] sb_store::StoreError),

    #[error("snapshot error: {0}")]
    Snapshot(#[from] sb_snapshot::SnapshotError),

    #[error("import/export error: {0}")]
    Port(#[from] sb_port::PortError),

    #[error("could not fetch sound: {0}")]
    SourceFetchFailed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl From<ModelError> for BoardError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::UnknownTab(_)
            | ModelError::UnknownSound { .. }
            | ModelError::UnknownLibraryEntry(_) => Self::NotFound(e.to_string()),
            ModelError::LastTab
            | ModelError::NotAPermutation { .. }
            | ModelError::IdentifiersExhausted(_) => {
                Self::InvalidOperation(e.to_string())
            }
        }
    }
}

pub type BoardResult<T> = Result<T, BoardError>;
