//! The soundboard engine.
//!
//! [`Board`] keeps an in-memory [`Workspace`](sb_types::Workspace) in step
//! with two durable stores: a snapshot slot holding the structural state and
//! a blob store holding audio content. It is the only surface the UI layer
//! talks to.
//!
//! # Guarantees
//!
//! - A failed mutation leaves the workspace as it was; no sound is left
//!   registered without its blob.
//! - A blob is deleted only once no library entry and no persistent sound
//!   references its key.
//! - Loading never fails on bad data: a corrupt snapshot yields a fresh
//!   board, a missing blob drops its sound. Both are reported in a
//!   [`LoadReport`].
//! - Older snapshots with inline content are migrated on first load.

pub mod board;
pub mod config;
pub mod error;
pub mod report;
pub mod source;

pub use board::Board;
pub use config::BoardConfig;
pub use error::{BoardError, BoardResult};
pub use report::{LibraryDeletion, LoadReport, Notice};
pub use source::{FileSource, SoundSource};

pub use sb_port::{ImportReport, PortableDocument};
pub use sb_store::Blob;
pub use sb_types::{LibraryEntry, Sound, SoundId, StorageKey, Tab, TabId};
