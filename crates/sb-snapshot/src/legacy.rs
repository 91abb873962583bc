//! Migration of the inline-content snapshot shape.
//!
//! Older documents stored each sound's audio as a data URL on the sound
//! record itself. [`migrate`] moves that content into the blob store under a
//! freshly issued key and rewrites the record to point at it. A second run
//! over the rewritten document finds nothing to do.

use sb_store::{Blob, BlobStore};
use sb_types::{SoundId, StorageKey, TabId};
use tracing::{info, warn};

use crate::document::{LibraryRecord, Snapshot};
use crate::error::SnapshotResult;

/// What a migration pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Sounds whose inline content now lives in the blob store.
    pub migrated: Vec<(TabId, SoundId, StorageKey)>,
    /// Sounds that carried both a key and inline content; the inline copy was
    /// discarded.
    pub stripped: Vec<(TabId, SoundId)>,
    /// Sounds whose inline content could not be decoded. Left untouched.
    pub failed: Vec<(TabId, SoundId)>,
}

impl MigrationReport {
    /// Whether the document changed and must be written back.
    pub fn is_dirty(&self) -> bool {
        !self.migrated.is_empty() || !self.stripped.is_empty()
    }
}

/// Whether any sound record still carries inline content.
pub fn needs_migration(snapshot: &Snapshot) -> bool {
    snapshot.sounds().any(|(_, s)| s.inline_content.is_some())
}

/// Rewrite every inline sound in `snapshot` to reference a stored blob.
///
/// Keys are issued from [`Snapshot::library_seq_floor`], so they never
/// collide with a key the document already mentions. Each migrated sound
/// also becomes a library entry named after it. A store failure aborts the
/// pass; sounds migrated before it keep their new keys.
pub async fn migrate(
    snapshot: &mut Snapshot,
    store: &dyn BlobStore,
) -> SnapshotResult<MigrationReport> {
    let mut report = MigrationReport::default();
    if !needs_migration(snapshot) {
        return Ok(report);
    }

    let mut next_seq = snapshot.library_seq_floor();
    let mut promoted = Vec::new();

    for tab in &mut snapshot.tabs {
        for sound in &mut tab.sounds {
            let Some(inline) = sound.inline_content.as_deref() else {
                continue;
            };
            if sound.storage_key.is_some() {
                sound.inline_content = None;
                report.stripped.push((tab.id, sound.id.clone()));
                continue;
            }

            let blob = match Blob::from_data_url(inline) {
                Ok(blob) => blob,
                Err(e) => {
                    warn!(tab = %tab.id, sound = %sound.id, error = %e, "undecodable inline content");
                    report.failed.push((tab.id, sound.id.clone()));
                    continue;
                }
            };

            // a document already holding `file-<u64::MAX>` has no keys left
            let Some(after) = next_seq.checked_add(1) else {
                warn!(tab = %tab.id, sound = %sound.id, "no storage key left for inline content");
                report.failed.push((tab.id, sound.id.clone()));
                continue;
            };
            let key = StorageKey::issue(next_seq);
            store.put(&key, &blob).await?;
            next_seq = after;

            sound.storage_key = Some(key.clone());
            sound.inline_content = None;
            promoted.push(LibraryRecord {
                id: key.clone(),
                name: sound.name.clone(),
            });
            report.migrated.push((tab.id, sound.id.clone(), key));
        }
    }

    snapshot.library.extend(promoted);
    snapshot.next_library_seq = snapshot.next_library_seq.max(next_seq);

    info!(
        migrated = report.migrated.len(),
        stripped = report.stripped.len(),
        failed = report.failed.len(),
        "legacy snapshot migrated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sb_store::InMemoryBlobStore;

    const KICK: &str = "data:audio/wav;base64,a2ljaw==";

    fn legacy_doc() -> Snapshot {
        Snapshot::from_json(&format!(
            r#"{{
                "masterVolume": 1, "tabCounter": 1, "soundCounter": 2, "currentTab": 0,
                "tabs": [{{"id": 0, "name": "Main", "sounds": [
                    {{"id": "sound-0", "name": "kick", "dataUrl": "{KICK}", "volume": 0.5}},
                    {{"id": "sound-1", "name": "snare", "fileKey": "file-3"}}
                ]}}]
            }}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn moves_inline_content_into_store() {
        let store = InMemoryBlobStore::new();
        let mut snap = legacy_doc();
        assert!(needs_migration(&snap));

        let report = migrate(&mut snap, &store).await.unwrap();
        assert!(report.is_dirty());
        assert_eq!(report.migrated.len(), 1);

        // file-3 is already taken, so the fresh key starts above it
        let key = StorageKey::issue(4);
        assert_eq!(report.migrated[0].2, key);
        let sound = &snap.tabs[0].sounds[0];
        assert_eq!(sound.storage_key.as_ref(), Some(&key));
        assert!(sound.inline_content.is_none());
        assert_eq!(sound.volume, 0.5);

        let blob = store.get(&key).await.unwrap().unwrap();
        assert_eq!(blob.media_type, "audio/wav");
        assert_eq!(blob.data, b"kick");

        assert_eq!(snap.library, vec![LibraryRecord { id: key, name: "kick".into() }]);
        assert_eq!(snap.next_library_seq, 5);
    }

    #[tokio::test]
    async fn second_pass_is_noop() {
        let store = InMemoryBlobStore::new();
        let mut snap = legacy_doc();
        migrate(&mut snap, &store).await.unwrap();
        let once = snap.clone();

        let report = migrate(&mut snap, &store).await.unwrap();
        assert!(!report.is_dirty());
        assert_eq!(snap, once);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn migrated_document_survives_reserialization() {
        let store = InMemoryBlobStore::new();
        let mut snap = legacy_doc();
        migrate(&mut snap, &store).await.unwrap();

        let reread = Snapshot::from_json(&snap.to_json()).unwrap();
        assert!(!needs_migration(&reread));
        assert_eq!(reread, snap);
    }

    #[tokio::test]
    async fn keyed_sound_loses_inline_copy() {
        let store = InMemoryBlobStore::new();
        let mut snap = Snapshot::from_json(&format!(
            r#"{{"tabs":[{{"id":0,"name":"t","sounds":[
                {{"id":"sound-0","name":"n","storageKey":"file-0","dataUrl":"{KICK}"}}]}}]}}"#
        ))
        .unwrap();
        let report = migrate(&mut snap, &store).await.unwrap();
        assert_eq!(report.stripped.len(), 1);
        assert!(report.migrated.is_empty());
        assert!(report.is_dirty());
        assert!(store.is_empty());
        assert_eq!(snap.tabs[0].sounds[0].storage_key, Some(StorageKey::issue(0)));
    }

    #[tokio::test]
    async fn bad_inline_content_is_left_alone() {
        let store = InMemoryBlobStore::new();
        let mut snap = Snapshot::from_json(
            r#"{"tabs":[{"id":0,"name":"t","sounds":[
                {"id":"sound-0","name":"n","dataUrl":"not a data url"}]}]}"#,
        )
        .unwrap();
        let report = migrate(&mut snap, &store).await.unwrap();
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_dirty());
        assert!(snap.tabs[0].sounds[0].inline_content.is_some());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = InMemoryBlobStore::new();
        store.set_offline(true);
        let mut snap = legacy_doc();
        assert!(migrate(&mut snap, &store).await.is_err());
    }

    #[tokio::test]
    async fn spent_key_space_leaves_inline_content() {
        let store = InMemoryBlobStore::new();
        let mut snap = Snapshot::from_json(&format!(
            r#"{{"tabs":[{{"id":0,"name":"t","sounds":[
                {{"id":"sound-0","name":"n","dataUrl":"{KICK}"}}]}}],
                "library":[{{"id":"file-18446744073709551615","name":"last"}}]}}"#
        ))
        .unwrap();
        let report = migrate(&mut snap, &store).await.unwrap();
        assert_eq!(report.failed, vec![(TabId::new(0), SoundId::issue(0))]);
        assert!(report.migrated.is_empty());
        assert!(store.is_empty());
        assert!(snap.tabs[0].sounds[0].inline_content.is_some());
    }
}
