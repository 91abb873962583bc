//! Durable storage for the soundboard.
//!
//! Two asymmetric stores back a workspace:
//!
//! - a **blob store**, keyed by [`StorageKey`](sb_types::StorageKey), holding
//!   raw audio content. It is asynchronous: [`BlobStore`].
//! - a **snapshot slot**, a single fixed location holding the serialized
//!   structural state. It is small and synchronous: [`SnapshotSlot`].
//!
//! # Backends
//!
//! - [`InMemoryBlobStore`] / [`InMemorySlot`] -- for tests and embedding
//! - [`FsBlobStore`] / [`FileSlot`] -- one framed file per blob, one JSON document
//!
//! # Design Rules
//!
//! 1. `get` of an absent key is `Ok(None)`, never an error.
//! 2. `remove` of an absent key is a no-op.
//! 3. `put` overwrites silently.
//! 4. No cross-key atomicity or ordering is promised.
//! 5. Snapshot writes replace the whole document atomically.

pub mod blob;
pub mod error;
pub mod fs;
pub mod memory;
pub mod slot;
pub mod traits;

pub use blob::Blob;
pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use slot::{FileSlot, InMemorySlot};
pub use traits::{BlobStore, SnapshotSlot};
