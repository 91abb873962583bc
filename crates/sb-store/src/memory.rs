use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use sb_types::StorageKey;

use crate::blob::Blob;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. Content is cloned on read and write.
/// The store can be taken offline to exercise the unavailable-store paths of
/// its callers.
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<StorageKey, Blob>>,
    offline: AtomicBool,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
            offline: AtomicBool::new(false),
        }
    }

    /// Make every subsequent operation fail with [`StoreError::Unavailable`]
    /// (or succeed again with `false`).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .map(|m| m.values().map(|b| b.len() as u64).sum())
            .unwrap_or(0)
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Poisoned(e.to_string())
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &StorageKey, blob: &Blob) -> StoreResult<StorageKey> {
        self.check_online()?;
        let mut map = self.blobs.write().map_err(poisoned)?;
        map.insert(key.clone(), blob.clone());
        Ok(key.clone())
    }

    async fn get(&self, key: &StorageKey) -> StoreResult<Option<Blob>> {
        self.check_online()?;
        let map = self.blobs.read().map_err(poisoned)?;
        Ok(map.get(key).cloned())
    }

    async fn remove(&self, key: &StorageKey) -> StoreResult<()> {
        self.check_online()?;
        let mut map = self.blobs.write().map_err(poisoned)?;
        map.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StoreResult<()> {
        self.check_online()?;
        self.blobs.write().map_err(poisoned)?.clear();
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<StorageKey>> {
        self.check_online()?;
        let map = self.blobs.read().map_err(poisoned)?;
        let mut keys: Vec<StorageKey> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    async fn contains(&self, key: &StorageKey) -> StoreResult<bool> {
        self.check_online()?;
        let map = self.blobs.read().map_err(poisoned)?;
        Ok(map.contains_key(key))
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("blob_count", &self.len())
            .field("offline", &self.offline.load(Ordering::SeqCst))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u64) -> StorageKey {
        StorageKey::issue(n)
    }

    fn wav(content: &[u8]) -> Blob {
        Blob::new("audio/wav", content.to_vec())
    }

    // -----------------------------------------------------------------------
    // Core CRUD
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_and_get() {
        let store = InMemoryBlobStore::new();
        let returned = store.put(&key(0), &wav(b"kick")).await.unwrap();
        assert_eq!(returned, key(0));
        assert_eq!(store.get(&key(0)).await.unwrap(), Some(wav(b"kick")));
    }

    #[tokio::test]
    async fn identical_content_under_distinct_keys() {
        let store = InMemoryBlobStore::new();
        store.put(&key(0), &wav(b"same")).await.unwrap();
        store.put(&key(1), &wav(b"same")).await.unwrap();
        // no dedup by content
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn put_overwrites() {
        let store = InMemoryBlobStore::new();
        store.put(&key(0), &wav(b"old")).await.unwrap();
        store.put(&key(0), &wav(b"new")).await.unwrap();
        assert_eq!(store.get(&key(0)).await.unwrap().unwrap().data, b"new");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn get_missing_is_none() {
        let store = InMemoryBlobStore::new();
        assert!(store.get(&key(9)).await.unwrap().is_none());
        assert!(!store.contains(&key(9)).await.unwrap());
    }

    #[tokio::test]
    async fn remove_is_idempotent() {
        let store = InMemoryBlobStore::new();
        store.put(&key(0), &wav(b"x")).await.unwrap();
        store.remove(&key(0)).await.unwrap();
        store.remove(&key(0)).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn clear_and_keys() {
        let store = InMemoryBlobStore::new();
        for n in [2, 0, 1] {
            store.put(&key(n), &wav(b"abc")).await.unwrap();
        }
        assert_eq!(store.keys().await.unwrap(), vec![key(0), key(1), key(2)]);
        assert_eq!(store.total_bytes(), 9);
        store.clear().await.unwrap();
        assert!(store.keys().await.unwrap().is_empty());
    }

    // -----------------------------------------------------------------------
    // Availability
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn offline_store_fails_every_operation() {
        let store = InMemoryBlobStore::new();
        store.put(&key(0), &wav(b"x")).await.unwrap();
        store.set_offline(true);
        assert!(matches!(
            store.put(&key(1), &wav(b"y")).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(matches!(store.get(&key(0)).await, Err(StoreError::Unavailable(_))));
        store.set_offline(false);
        assert!(store.get(&key(0)).await.unwrap().is_some());
    }

    #[test]
    fn debug_format() {
        let debug = format!("{:?}", InMemoryBlobStore::new());
        assert!(debug.contains("InMemoryBlobStore"));
        assert!(debug.contains("blob_count"));
    }
}
