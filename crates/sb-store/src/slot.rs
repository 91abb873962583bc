//! Snapshot slot backends.
//!
//! The slot holds exactly one document. [`FileSlot`] replaces it atomically
//! by writing a temporary file in the same directory and persisting it over
//! the old one.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::SnapshotSlot;

/// Snapshot slot backed by a single file.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    /// A slot at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }
}

impl SnapshotSlot for FileSlot {
    fn read(&self) -> StoreResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(doc) => Ok(Some(doc)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, document: &str) -> StoreResult<()> {
        std::fs::create_dir_all(self.dir())?;
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        tmp.write_all(document.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        debug!(path = %self.path.display(), len = document.len(), "snapshot written");
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshot slot held in memory.
#[derive(Debug, Default)]
pub struct InMemorySlot {
    document: RwLock<Option<String>>,
}

impl InMemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// A slot already holding `document`.
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: RwLock::new(Some(document.into())),
        }
    }
}

impl SnapshotSlot for InMemorySlot {
    fn read(&self) -> StoreResult<Option<String>> {
        let doc = self
            .document
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        Ok(doc.clone())
    }

    fn write(&self, document: &str) -> StoreResult<()> {
        let mut doc = self
            .document
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        *doc = Some(document.to_string());
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        let mut doc = self
            .document
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))?;
        *doc = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_slot_empty_until_written() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("state.json"));
        assert!(slot.read().unwrap().is_none());

        slot.write("{\"a\":1}").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn file_slot_overwrites_whole_document() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("nested").join("state.json"));
        slot.write("a much longer first document").unwrap();
        slot.write("short").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("short"));
        // no temporary files left behind
        let leftovers = std::fs::read_dir(dir.path().join("nested")).unwrap().count();
        assert_eq!(leftovers, 1);
    }

    #[test]
    fn file_slot_clear_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let slot = FileSlot::new(dir.path().join("state.json"));
        slot.clear().unwrap();
        slot.write("x").unwrap();
        slot.clear().unwrap();
        assert!(slot.read().unwrap().is_none());
    }

    #[test]
    fn memory_slot_roundtrip() {
        let slot = InMemorySlot::with_document("old");
        assert_eq!(slot.read().unwrap().as_deref(), Some("old"));
        slot.write("new").unwrap();
        assert_eq!(slot.read().unwrap().as_deref(), Some("new"));
        slot.clear().unwrap();
        assert!(slot.read().unwrap().is_none());
    }
}
