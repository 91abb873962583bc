use sb_snapshot::{LibraryRecord, Snapshot};
use sb_store::{Blob, BlobStore};
use sb_types::StorageKey;
use tracing::{info, warn};

use crate::document::PortableDocument;
use crate::error::PortResult;

/// Per-file outcome of [`restore`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub restored: Vec<StorageKey>,
    /// Files that could not be parsed or decoded.
    pub skipped: Vec<String>,
}

/// Replace everything in `store` with the files bundled in `doc`.
///
/// The store is cleared first. Each file is written back under its original
/// key; one that fails to decode is skipped. Returns the snapshot to install,
/// whose library also lists every restored file.
///
/// `doc` has already passed [`PortableDocument::from_json`], so by the time
/// anything is deleted the state is known to be usable.
pub async fn restore(
    doc: &PortableDocument,
    store: &dyn BlobStore,
) -> PortResult<(Snapshot, ImportReport)> {
    let mut report = ImportReport {
        skipped: doc.rejected.clone(),
        ..ImportReport::default()
    };

    store.clear().await?;

    let mut state = doc.state.clone();
    for (key, file) in &doc.files {
        let blob = match Blob::from_data_url(&file.inline_content) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(%key, error = %e, "skipping undecodable bundled file");
                report.skipped.push(key.to_string());
                continue;
            }
        };
        store.put(key, &blob).await?;
        report.restored.push(key.clone());

        if !state.library.iter().any(|e| &e.id == key) {
            state.library.push(LibraryRecord {
                id: key.clone(),
                name: file.name.clone(),
            });
        }
    }

    info!(
        restored = report.restored.len(),
        skipped = report.skipped.len(),
        "board import restored files"
    );
    Ok((state, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::export;
    use sb_store::InMemoryBlobStore;
    use sb_types::{LibraryEntry, TabId, Workspace};

    async fn exported() -> PortableDocument {
        let store = InMemoryBlobStore::new();
        let mut ws = Workspace::new("Main");
        let key = ws.issue_storage_key().unwrap();
        store.put(&key, &Blob::new("audio/ogg", b"clap".to_vec())).await.unwrap();
        ws.upsert_library_entry(LibraryEntry::new(key.clone(), "clap.ogg"));
        ws.place_from_library(TabId::new(0), &key).unwrap();
        export(&ws, &store).await.unwrap()
    }

    #[tokio::test]
    async fn restores_under_original_keys() {
        let doc = exported().await;
        let target = InMemoryBlobStore::new();
        target.put(&StorageKey::issue(9), &Blob::new("audio/wav", vec![9])).await.unwrap();

        let (state, report) = restore(&doc, &target).await.unwrap();
        assert_eq!(report.restored, vec![StorageKey::issue(0)]);
        assert!(report.skipped.is_empty());
        assert_eq!(state, doc.state);

        // pre-existing content is gone
        assert_eq!(target.keys().await.unwrap(), vec![StorageKey::issue(0)]);
        let blob = target.get(&StorageKey::issue(0)).await.unwrap().unwrap();
        assert_eq!(blob.media_type, "audio/ogg");
        assert_eq!(blob.data, b"clap");
    }

    #[tokio::test]
    async fn corrupt_file_is_skipped() {
        let doc = PortableDocument::from_json(
            r#"{"state":{},"files":{
                "file-0":{"name":"good","inlineContent":"data:audio/wav;base64,AAE="},
                "file-1":{"name":"bad","inlineContent":"data:audio/wav;base64,!!!"}
            }}"#,
        )
        .unwrap();
        let store = InMemoryBlobStore::new();
        let (state, report) = restore(&doc, &store).await.unwrap();

        assert_eq!(report.restored, vec![StorageKey::issue(0)]);
        assert_eq!(report.skipped, vec!["file-1".to_string()]);
        assert_eq!(store.len(), 1);
        // restored files not listed in the state join the library
        assert_eq!(state.library.len(), 1);
        assert_eq!(state.library[0].name, "good");
    }

    #[tokio::test]
    async fn unavailable_store_fails() {
        let doc = exported().await;
        let store = InMemoryBlobStore::new();
        store.set_offline(true);
        assert!(restore(&doc, &store).await.is_err());
    }
}
