//! Snapshot codec for the soundboard.
//!
//! A [`Snapshot`] is the serializable structural state of a workspace:
//! counters, tabs with their persistent sounds, and the library. Binary
//! content is never part of it; sounds carry storage keys into the blob store.
//!
//! - [`encode`] turns a workspace into a snapshot, omitting ephemeral sounds.
//! - [`decode`] rebuilds a workspace, dropping sounds whose blob is gone.
//! - [`legacy::migrate`] rewrites the older inline-content shape in place.
//!
//! For any snapshot `S` produced by [`encode`], `encode(decode(S)) == S`.

pub mod codec;
pub mod document;
pub mod error;
pub mod legacy;

pub use codec::{decode, encode, Decoded, DroppedSound};
pub use document::{LibraryRecord, Snapshot, SoundRecord, TabRecord};
pub use error::{SnapshotError, SnapshotResult};
pub use legacy::{migrate, MigrationReport};
