//! Filesystem blob store.
//!
//! Each blob lives in its own file under the store root:
//!
//! ```text
//! [4 bytes: payload length (little-endian u32)]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [N bytes: payload (bincode-serialized Blob)]
//! ```
//!
//! Writes go to a sibling `.tmp` file first, are synced, and are renamed into
//! place, so a reader sees either the old or the new content. A frame that fails its
//! length or CRC check is logged and read as absent.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use sb_types::StorageKey;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::blob::Blob;
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;
const BLOB_EXT: &str = ".blob";
const TMP_EXT: &str = ".tmp";

/// Process-wide handles, one per store root.
static HANDLES: OnceLock<Mutex<HashMap<PathBuf, Arc<FsBlobStore>>>> = OnceLock::new();

/// Blob store keeping one framed file per key.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (or create) a store rooted at `root`.
    ///
    /// Fails with [`StoreError::Unavailable`] if the root cannot be created or
    /// is not a directory.
    pub async fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        let unavailable = |e: io::Error| StoreError::Unavailable(format!("{}: {e}", root.display()));

        tokio::fs::create_dir_all(&root).await.map_err(unavailable)?;
        let meta = tokio::fs::metadata(&root).await.map_err(unavailable)?;
        if !meta.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                root.display()
            )));
        }

        info!(root = %root.display(), "blob store opened");
        Ok(Self { root })
    }

    /// The memoized handle for `root`.
    ///
    /// The first caller for a root pays the open cost; later callers share
    /// the same handle.
    pub async fn shared(root: impl AsRef<Path>) -> StoreResult<Arc<Self>> {
        let root = root.as_ref().to_path_buf();
        let registry = HANDLES.get_or_init(|| Mutex::new(HashMap::new()));
        let mut handles = registry.lock().await;
        if let Some(handle) = handles.get(&root) {
            return Ok(Arc::clone(handle));
        }
        let handle = Arc::new(Self::open(&root).await?);
        handles.insert(root, Arc::clone(&handle));
        Ok(handle)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &StorageKey) -> PathBuf {
        self.root.join(format!("{}{BLOB_EXT}", encode_key(key.as_str())))
    }
}

/// Escape a key into a portable file name: `[A-Za-z0-9_-]` pass through,
/// everything else becomes `%XX`.
fn encode_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

fn decode_key(name: &str) -> Option<String> {
    let bytes = name.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = name.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

fn frame(blob: &Blob) -> StoreResult<Vec<u8>> {
    let payload = bincode::serialize(blob).map_err(|e| StoreError::Serialization(e.to_string()))?;
    let length = u32::try_from(payload.len())
        .map_err(|_| StoreError::Serialization("blob exceeds 4 GiB".into()))?;
    let crc = crc32fast::hash(&payload);

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    buf.extend_from_slice(&length.to_le_bytes());
    buf.extend_from_slice(&crc.to_le_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

fn unframe(bytes: &[u8]) -> Result<Blob, String> {
    if bytes.len() < HEADER_SIZE {
        return Err(format!("truncated header ({} bytes)", bytes.len()));
    }
    let length = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let expected_crc = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    let payload = &bytes[HEADER_SIZE..];
    if payload.len() != length {
        return Err(format!("length mismatch: header {length}, found {}", payload.len()));
    }
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(format!("crc mismatch: expected {expected_crc:08x}, got {actual_crc:08x}"));
    }
    bincode::deserialize(payload).map_err(|e| e.to_string())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn put(&self, key: &StorageKey, blob: &Blob) -> StoreResult<StorageKey> {
        let path = self.path_for(key);
        let mut tmp = path.clone().into_os_string();
        tmp.push(TMP_EXT);

        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&frame(blob)?).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, &path).await?;
        debug!(%key, len = blob.len(), "blob stored");
        Ok(key.clone())
    }

    async fn get(&self, key: &StorageKey) -> StoreResult<Option<Blob>> {
        match tokio::fs::read(self.path_for(key)).await {
            Ok(bytes) => match unframe(&bytes) {
                Ok(blob) => Ok(Some(blob)),
                Err(reason) => {
                    warn!(%key, %reason, "corrupt blob file; treating as absent");
                    Ok(None)
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, key: &StorageKey) -> StoreResult<()> {
        match tokio::fs::remove_file(self.path_for(key)).await {
            Ok(()) => {
                debug!(%key, "blob removed");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn clear(&self) -> StoreResult<()> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.ends_with(BLOB_EXT) || name.ends_with(TMP_EXT) {
                tokio::fs::remove_file(entry.path()).await?;
                removed += 1;
            }
        }
        info!(removed, "blob store cleared");
        Ok(())
    }

    async fn keys(&self) -> StoreResult<Vec<StorageKey>> {
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(BLOB_EXT)) else {
                continue;
            };
            match decode_key(stem).map(StorageKey::new) {
                Some(Ok(key)) => keys.push(key),
                _ => warn!(file = stem, "skipping blob file with undecodable name"),
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn contains(&self, key: &StorageKey) -> StoreResult<bool> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }
}
