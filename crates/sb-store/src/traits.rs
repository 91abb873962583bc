use async_trait::async_trait;
use sb_types::StorageKey;

use crate::blob::Blob;
use crate::error::StoreResult;

/// Durable key -> content map.
///
/// All implementations must satisfy these invariants:
/// - `put` overwrites an existing key silently and returns the key.
/// - `get` returns `Ok(None)` for an absent key; absence is not an error.
/// - `remove` of an absent key is a no-op.
/// - Operations on different keys carry no atomicity or ordering guarantee.
///   A `get` racing a `remove` of the same key may observe either outcome.
/// - The store never interprets content.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store content under `key`.
    async fn put(&self, key: &StorageKey, blob: &Blob) -> StoreResult<StorageKey>;

    /// Read content by key.
    async fn get(&self, key: &StorageKey) -> StoreResult<Option<Blob>>;

    /// Delete content by key.
    ///
    /// Intended for reachability-driven collection only. Removing a key that
    /// is still referenced leaves a dangling sound behind.
    async fn remove(&self, key: &StorageKey) -> StoreResult<()>;

    /// Delete everything.
    async fn clear(&self) -> StoreResult<()>;

    /// All keys currently stored, sorted.
    async fn keys(&self) -> StoreResult<Vec<StorageKey>>;

    /// Check whether content exists for `key`.
    ///
    /// Default implementation reads the content. Backends may override.
    async fn contains(&self, key: &StorageKey) -> StoreResult<bool> {
        Ok(self.get(key).await?.is_some())
    }
}

/// The single fixed location holding the serialized snapshot document.
///
/// Writes replace the whole document; last write wins. Callers serialize
/// their own writes.
pub trait SnapshotSlot: Send + Sync {
    /// Read the stored document, `Ok(None)` if nothing was ever written.
    fn read(&self) -> StoreResult<Option<String>>;

    /// Replace the stored document.
    fn write(&self, document: &str) -> StoreResult<()>;

    /// Forget the stored document.
    fn clear(&self) -> StoreResult<()>;
}
