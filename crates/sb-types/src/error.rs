use thiserror::Error;

use crate::ids::{SoundId, StorageKey, TabId};

/// Errors produced when parsing identifiers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("identifier must not be empty")]
    EmptyIdentifier,

    #[error("invalid tab id: {0}")]
    InvalidTabId(String),
}

/// Violations of workspace model rules.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("unknown tab: {0}")]
    UnknownTab(TabId),

    #[error("unknown sound {sound} in tab {tab}")]
    UnknownSound { tab: TabId, sound: SoundId },

    #[error("unknown library entry: {0}")]
    UnknownLibraryEntry(StorageKey),

    #[error("cannot remove the last remaining tab")]
    LastTab,

    #[error("new order for tab {tab} is not a permutation of its sounds")]
    NotAPermutation { tab: TabId },

    #[error("no {0} left to issue")]
    IdentifiersExhausted(&'static str),
}

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
