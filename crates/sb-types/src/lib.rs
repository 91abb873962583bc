//! Foundation types for the soundboard.
//!
//! This crate holds the volatile working model that every other soundboard
//! crate operates on. It performs no I/O: storing content, persisting
//! snapshots and collecting blobs are the business of the crates above it.
//!
//! # Key Types
//!
//! - [`TabId`], [`SoundId`], [`StorageKey`] -- typed identifiers issued by monotonic counters
//! - [`Workspace`] -- the in-memory source of truth: ordered tabs, library, counters
//! - [`Tab`], [`Sound`], [`LibraryEntry`] -- the parts of a workspace
//!
//! # Reachability
//!
//! A blob may only be deleted when no library entry and no persistent sound
//! references its key. The check lives in one place, [`Workspace::is_referenced`],
//! and is recomputed by full scan at every deletion point.

pub mod error;
pub mod ids;
pub mod model;
pub mod reach;

pub use error::{ModelError, ModelResult, TypeError};
pub use ids::{SoundId, StorageKey, TabId};
pub use model::{Counters, LibraryEntry, Sound, Tab, Workspace, WorkspaceParts, DEFAULT_TAB_NAME};
