use std::collections::HashMap;
use std::sync::Arc;

use sb_port::{ImportReport, PortableDocument};
use sb_snapshot::{decode, encode, migrate, Snapshot};
use sb_store::{
    Blob, BlobStore, FileSlot, FsBlobStore, InMemoryBlobStore, InMemorySlot, SnapshotSlot,
};
use sb_types::{
    LibraryEntry, ModelError, ModelResult, Sound, SoundId, StorageKey, Tab, TabId, Workspace,
    DEFAULT_TAB_NAME,
};
use tracing::{debug, info, warn};

use crate::config::BoardConfig;
use crate::error::{BoardError, BoardResult};
use crate::report::{LibraryDeletion, LoadReport, Notice};
use crate::source::{name_from_locator, SoundSource};

/// A soundboard session: the workspace plus the stores that keep it.
///
/// Every mutation takes `&mut self`, so mutations never interleave. A
/// mutation either commits (the snapshot slot holds the new state) or leaves
/// the workspace exactly as it was. Blobs are only ever deleted after the
/// commit, and only when nothing references them any more.
pub struct Board {
    workspace: Workspace,
    blobs: Arc<dyn BlobStore>,
    slot: Arc<dyn SnapshotSlot>,
    /// Content of ephemeral sounds, held for the session only.
    transient: HashMap<SoundId, Blob>,
    default_tab_name: String,
}

impl Board {
    /// Open the filesystem board described by `config`.
    pub async fn open(config: &BoardConfig) -> BoardResult<(Self, LoadReport)> {
        info!(data_dir = %config.data_dir.display(), "opening board");
        let blobs = FsBlobStore::shared(config.blob_path()).await?;
        let slot = FileSlot::new(config.snapshot_path());
        Self::with_stores(blobs, Arc::new(slot), &config.default_tab_name).await
    }

    /// Load a board from arbitrary stores.
    pub async fn with_stores(
        blobs: Arc<dyn BlobStore>,
        slot: Arc<dyn SnapshotSlot>,
        default_tab_name: &str,
    ) -> BoardResult<(Self, LoadReport)> {
        let (workspace, report) = load(blobs.as_ref(), slot.as_ref(), default_tab_name).await?;
        let board = Self {
            workspace,
            blobs,
            slot,
            transient: HashMap::new(),
            default_tab_name: default_tab_name.to_string(),
        };
        Ok((board, report))
    }

    /// A fresh board backed by in-memory stores.
    pub fn in_memory() -> Self {
        Self {
            workspace: Workspace::new(DEFAULT_TAB_NAME),
            blobs: Arc::new(InMemoryBlobStore::new()),
            slot: Arc::new(InMemorySlot::new()),
            transient: HashMap::new(),
            default_tab_name: DEFAULT_TAB_NAME.to_string(),
        }
    }

    // ---- Queries ----

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn list_tabs(&self) -> &[Tab] {
        self.workspace.tabs()
    }

    pub fn list_library(&self) -> &[LibraryEntry] {
        self.workspace.library()
    }

    pub fn active_tab(&self) -> TabId {
        self.workspace.active_tab()
    }

    pub fn is_referenced(&self, key: &StorageKey) -> bool {
        self.workspace.is_referenced(key)
    }

    /// Sounds placing `key`, for confirming a library deletion.
    pub fn library_references(&self, key: &StorageKey) -> Vec<(TabId, SoundId)> {
        self.workspace.placements(key)
    }

    /// Playable content of a sound, `None` if its blob is gone.
    pub async fn sound_content(&self, tab: TabId, sound: &SoundId) -> BoardResult<Option<Blob>> {
        let s = self.workspace.sound(tab, sound)?;
        if s.ephemeral {
            return Ok(self.transient.get(&s.id).cloned());
        }
        match &s.storage_key {
            Some(key) => Ok(self.blobs.get(key).await?),
            None => Ok(None),
        }
    }

    // ---- Tabs ----

    pub fn create_tab(&mut self, name: &str) -> BoardResult<TabId> {
        self.apply(|ws| ws.create_tab(name))
    }

    /// Rename a tab. Unknown tabs and blank names are ignored.
    pub fn rename_tab(&mut self, tab: TabId, name: &str) -> BoardResult<bool> {
        self.apply(|ws| Ok(ws.rename_tab(tab, name)))
    }

    /// Remove a tab with all its sounds. Returns the keys whose blobs were
    /// deleted as a result.
    pub async fn remove_tab(&mut self, tab: TabId) -> BoardResult<Vec<StorageKey>> {
        let removed = self.apply(|ws| ws.remove_tab(tab))?;
        debug!(%tab, sounds = removed.sounds.len(), "tab removed");
        Ok(self.release(&removed.sounds).await)
    }

    pub fn switch_active(&mut self, tab: TabId) -> BoardResult<()> {
        self.apply(|ws| ws.switch_active(tab))
    }

    // ---- Sounds ----

    /// Add new content as a sound in `tab`.
    ///
    /// Persistent content is stored under a fresh key and also becomes a
    /// library entry. Ephemeral content is held in memory only and is never
    /// written anywhere. If any step fails, nothing is left registered.
    pub async fn add_sound(
        &mut self,
        tab: TabId,
        content: Blob,
        name: &str,
        ephemeral: bool,
    ) -> BoardResult<SoundId> {
        self.workspace.tab(tab).ok_or(ModelError::UnknownTab(tab))?;
        let name = match name.trim() {
            "" => "audio",
            trimmed => trimmed,
        };
        let before = self.workspace.clone();

        if ephemeral {
            let id = self.workspace.issue_sound_id()?;
            let staged = self
                .workspace
                .push_sound(tab, Sound::ephemeral(id.clone(), name));
            self.settle(staged, before)?;
            debug!(%tab, sound = %id, "ephemeral sound added");
            self.transient.insert(id.clone(), content);
            return Ok(id);
        }

        let key = self.workspace.issue_storage_key()?;
        let id = match self.workspace.issue_sound_id() {
            Ok(id) => id,
            Err(e) => {
                self.workspace = before;
                return Err(e.into());
            }
        };
        if let Err(e) = self.blobs.put(&key, &content).await {
            self.workspace = before;
            return Err(e.into());
        }
        self.workspace
            .upsert_library_entry(LibraryEntry::new(key.clone(), name));
        let staged = self
            .workspace
            .push_sound(tab, Sound::persistent(id.clone(), name, key.clone()));
        if let Err(e) = self.settle(staged, before) {
            self.discard(&key).await;
            return Err(e);
        }
        debug!(%tab, sound = %id, %key, "sound added");
        Ok(id)
    }

    /// Fetch content from `source` and add it as a sound named after the
    /// locator. Content that is not audio is rejected.
    pub async fn add_sound_from_source(
        &mut self,
        tab: TabId,
        source: &dyn SoundSource,
        locator: &str,
        ephemeral: bool,
    ) -> BoardResult<SoundId> {
        self.workspace.tab(tab).ok_or(ModelError::UnknownTab(tab))?;
        let content = source.fetch(locator).await?;
        if !content.is_audio() {
            return Err(BoardError::SourceFetchFailed(format!(
                "{locator} is not audio ({})",
                content.media_type
            )));
        }
        self.add_sound(tab, content, &name_from_locator(locator), ephemeral)
            .await
    }

    /// Place a library entry's content into `tab` as a new sound. An entry
    /// whose blob is gone cannot be placed.
    pub async fn add_from_library(
        &mut self,
        tab: TabId,
        key: &StorageKey,
    ) -> BoardResult<SoundId> {
        if !self.blobs.contains(key).await? {
            return Err(BoardError::NotFound(format!("content of library entry {key}")));
        }
        self.apply(|ws| ws.place_from_library(tab, key))
    }

    /// Rename a sound; library-backed names change everywhere at once.
    pub fn rename_sound(&mut self, tab: TabId, sound: &SoundId, name: &str) -> BoardResult<bool> {
        self.apply(|ws| ws.rename_sound(tab, sound, name))
    }

    /// Remove a sound. Returns the keys whose blobs were deleted as a result.
    pub async fn remove_sound(
        &mut self,
        tab: TabId,
        sound: &SoundId,
    ) -> BoardResult<Vec<StorageKey>> {
        let removed = self.apply(|ws| ws.remove_sound(tab, sound))?;
        debug!(%tab, %sound, "sound removed");
        Ok(self.release(std::slice::from_ref(&removed)).await)
    }

    /// Remove every sound of a tab.
    pub async fn clear_tab(&mut self, tab: TabId) -> BoardResult<Vec<StorageKey>> {
        let removed = self.apply(|ws| ws.clear_tab(tab))?;
        debug!(%tab, sounds = removed.len(), "tab cleared");
        Ok(self.release(&removed).await)
    }

    pub fn reorder_sounds(&mut self, tab: TabId, order: &[SoundId]) -> BoardResult<()> {
        self.apply(|ws| ws.reorder_sounds(tab, order))
    }

    pub fn set_sound_volume(&mut self, tab: TabId, sound: &SoundId, volume: f64) -> BoardResult<()> {
        self.apply(|ws| ws.set_sound_volume(tab, sound, volume))
    }

    pub fn toggle_loop(&mut self, tab: TabId, sound: &SoundId) -> BoardResult<bool> {
        self.apply(|ws| ws.toggle_loop(tab, sound))
    }

    pub fn set_master_volume(&mut self, volume: f64) -> BoardResult<()> {
        self.apply(|ws| {
            ws.set_master_volume(volume);
            Ok(())
        })
    }

    // ---- Library ----

    /// Store content as a library entry without placing it anywhere.
    pub async fn add_to_library(&mut self, content: Blob, name: &str) -> BoardResult<StorageKey> {
        let name = match name.trim() {
            "" => "audio",
            trimmed => trimmed,
        };
        let before = self.workspace.clone();
        let key = self.workspace.issue_storage_key()?;
        if let Err(e) = self.blobs.put(&key, &content).await {
            self.workspace = before;
            return Err(e.into());
        }
        self.workspace
            .upsert_library_entry(LibraryEntry::new(key.clone(), name));
        if let Err(e) = self.settle(Ok(()), before) {
            self.discard(&key).await;
            return Err(e);
        }
        debug!(%key, "library entry added");
        Ok(key)
    }

    pub fn rename_library_entry(&mut self, key: &StorageKey, name: &str) -> BoardResult<bool> {
        self.apply(|ws| ws.rename_library_entry(key, name))
    }

    /// Remove a library entry.
    ///
    /// Sounds placing the key are left in place and keep playing; the blob
    /// is deleted only if none remain. When the last of them is removed
    /// later, the blob goes with it.
    pub async fn delete_library_entry(&mut self, key: &StorageKey) -> BoardResult<LibraryDeletion> {
        let references = self.workspace.placements(key);
        self.apply(|ws| ws.remove_library_entry(key))?;
        let blob_removed = !self.collect(std::slice::from_ref(key)).await.is_empty();
        debug!(%key, references = references.len(), blob_removed, "library entry deleted");
        Ok(LibraryDeletion {
            references,
            blob_removed,
        })
    }

    /// Delete every stored blob that nothing references.
    ///
    /// Mutations collect their own garbage; this catches blobs left behind
    /// when a delete failed after its commit.
    pub async fn sweep(&mut self) -> BoardResult<Vec<StorageKey>> {
        let keys = self.blobs.keys().await?;
        let unreachable = self.workspace.unreachable(&keys);
        for key in &unreachable {
            self.blobs.remove(key).await?;
        }
        info!(removed = unreachable.len(), "blob store swept");
        Ok(unreachable)
    }

    // ---- Import / export ----

    /// Bundle the board into a portable document.
    pub async fn export_all(&self) -> BoardResult<PortableDocument> {
        Ok(sb_port::export(&self.workspace, self.blobs.as_ref()).await?)
    }

    /// Replace the whole board with the contents of `doc`.
    ///
    /// Destructive: the blob store and library are cleared first. Ephemeral
    /// sounds of the current session are released. If a step after the clear
    /// fails, the board is left with a fresh workspace rather than one whose
    /// keys point at replaced content.
    pub async fn import_all(
        &mut self,
        doc: &PortableDocument,
    ) -> BoardResult<(ImportReport, LoadReport)> {
        let (state, imported) = match sb_port::restore(doc, self.blobs.as_ref()).await {
            Ok(restored) => restored,
            Err(e) => return Err(self.abandon(e.into())),
        };
        self.transient.clear();
        if let Err(e) = self.slot.write(&state.to_json()) {
            return Err(self.abandon(e.into()));
        }
        let (workspace, report) =
            match load(self.blobs.as_ref(), self.slot.as_ref(), &self.default_tab_name).await {
                Ok(loaded) => loaded,
                Err(e) => return Err(self.abandon(e)),
            };
        self.workspace = workspace;
        info!(
            restored = imported.restored.len(),
            skipped = imported.skipped.len(),
            "board imported"
        );
        Ok((imported, report))
    }

    /// Parse and import a portable document. A document without a usable
    /// `state` is rejected before anything is touched.
    pub async fn import_json(&mut self, text: &str) -> BoardResult<(ImportReport, LoadReport)> {
        let doc = PortableDocument::from_json(text)?;
        self.import_all(&doc).await
    }

    /// End the session, releasing every transient handle.
    pub fn close(mut self) {
        self.transient.clear();
        debug!("board closed");
    }

    // ---- Internals ----

    /// Drop the in-memory model after a failed import touched the stores.
    fn abandon(&mut self, error: BoardError) -> BoardError {
        warn!(error = %error, "import failed after clearing the store; starting fresh");
        self.transient.clear();
        self.workspace = Workspace::new(&self.default_tab_name);
        error
    }

    /// Run a model operation and commit it, restoring the previous workspace
    /// if either step fails.
    fn apply<T>(&mut self, op: impl FnOnce(&mut Workspace) -> ModelResult<T>) -> BoardResult<T> {
        let before = self.workspace.clone();
        let staged = op(&mut self.workspace);
        self.settle(staged, before)
    }

    fn settle<T>(&mut self, staged: ModelResult<T>, before: Workspace) -> BoardResult<T> {
        let out = match staged {
            Ok(out) => out,
            Err(e) => {
                self.workspace = before;
                return Err(e.into());
            }
        };
        if let Err(e) = self.persist() {
            warn!(error = %e, "snapshot write failed; rolling back");
            self.workspace = before;
            return Err(e);
        }
        Ok(out)
    }

    fn persist(&self) -> BoardResult<()> {
        self.slot.write(&encode(&self.workspace).to_json())?;
        Ok(())
    }

    /// Drop transient handles of removed sounds and collect their blobs.
    async fn release(&mut self, removed: &[Sound]) -> Vec<StorageKey> {
        for sound in removed.iter().filter(|s| s.ephemeral) {
            self.transient.remove(&sound.id);
        }
        let keys: Vec<StorageKey> = removed
            .iter()
            .filter_map(|s| s.persisted_key().cloned())
            .collect();
        self.collect(&keys).await
    }

    /// Delete whichever of `candidates` nothing references. A failed delete
    /// is logged and left for [`Board::sweep`].
    async fn collect(&self, candidates: &[StorageKey]) -> Vec<StorageKey> {
        let mut removed = Vec::new();
        for key in self.workspace.unreachable(candidates) {
            match self.blobs.remove(&key).await {
                Ok(()) => {
                    debug!(%key, "unreferenced blob deleted");
                    removed.push(key);
                }
                Err(e) => warn!(%key, error = %e, "could not delete unreferenced blob"),
            }
        }
        removed
    }

    /// Best-effort removal of a blob stored by an operation that then failed.
    async fn discard(&self, key: &StorageKey) {
        if let Err(e) = self.blobs.remove(key).await {
            warn!(%key, error = %e, "could not discard blob of failed operation");
        }
    }
}

impl std::fmt::Debug for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Board")
            .field("tabs", &self.workspace.tabs().len())
            .field("library", &self.workspace.library().len())
            .field("transient", &self.transient.len())
            .finish()
    }
}

/// Rebuild a workspace from the slot, migrating and degrading as needed.
async fn load(
    blobs: &dyn BlobStore,
    slot: &dyn SnapshotSlot,
    default_tab_name: &str,
) -> BoardResult<(Workspace, LoadReport)> {
    let mut report = LoadReport::default();
    let Some(document) = slot.read()? else {
        debug!("no saved board; starting fresh");
        return Ok((Workspace::new(default_tab_name), report));
    };

    let mut snapshot = match Snapshot::from_json(&document) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!(error = %e, "saved board is unreadable; starting fresh");
            report.notices.push(Notice::SnapshotCorrupt {
                reason: e.to_string(),
            });
            return Ok((Workspace::new(default_tab_name), report));
        }
    };

    let migration = migrate(&mut snapshot, blobs).await?;
    if migration.is_dirty() {
        slot.write(&snapshot.to_json())?;
        if !migration.migrated.is_empty() {
            report.notices.push(Notice::Migrated {
                sounds: migration.migrated.len(),
            });
        }
    }

    let decoded = decode(&snapshot, blobs).await?;
    report
        .notices
        .extend(decoded.dropped.into_iter().map(|d| Notice::BlobMissing {
            tab: d.tab,
            sound: d.sound,
            key: d.key,
        }));
    info!(
        tabs = decoded.workspace.tabs().len(),
        library = decoded.workspace.library().len(),
        notices = report.notices.len(),
        "board loaded"
    );
    Ok((decoded.workspace, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn wav(content: &[u8]) -> Blob {
        Blob::new("audio/wav", content.to_vec())
    }

    /// Snapshot slot that can be told to fail writes.
    #[derive(Default)]
    struct FlakySlot {
        inner: InMemorySlot,
        failing: AtomicBool,
    }

    impl SnapshotSlot for FlakySlot {
        fn read(&self) -> sb_store::StoreResult<Option<String>> {
            self.inner.read()
        }

        fn write(&self, document: &str) -> sb_store::StoreResult<()> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(sb_store::StoreError::Unavailable("slot offline".into()));
            }
            self.inner.write(document)
        }

        fn clear(&self) -> sb_store::StoreResult<()> {
            self.inner.clear()
        }
    }

    async fn board() -> (Board, Arc<InMemoryBlobStore>, Arc<FlakySlot>) {
        let store = Arc::new(InMemoryBlobStore::new());
        let slot = Arc::new(FlakySlot::default());
        let (board, report) = Board::with_stores(store.clone(), slot.clone(), "Main")
            .await
            .unwrap();
        assert!(report.is_clean());
        (board, store, slot)
    }

    #[tokio::test]
    async fn fresh_board_has_default_tab() {
        let (board, _, _) = board().await;
        assert_eq!(board.list_tabs().len(), 1);
        assert_eq!(board.list_tabs()[0].name, "Main");
    }

    #[tokio::test]
    async fn add_sound_stores_blob_and_library_entry() {
        let (mut board, store, _) = board().await;
        let id = board.add_sound(TabId::new(0), wav(b"kick"), "kick.wav", false).await.unwrap();

        assert_eq!(id, SoundId::issue(0));
        let key = StorageKey::issue(0);
        assert!(store.contains(&key).await.unwrap());
        assert_eq!(board.list_library()[0], LibraryEntry::new(key.clone(), "kick.wav"));
        assert_eq!(
            board.sound_content(TabId::new(0), &id).await.unwrap(),
            Some(wav(b"kick"))
        );
    }

    #[tokio::test]
    async fn ephemeral_sound_touches_no_store() {
        let (mut board, store, _) = board().await;
        let id = board.add_sound(TabId::new(0), wav(b"q"), "quick", true).await.unwrap();

        assert!(store.is_empty());
        assert!(board.list_library().is_empty());
        assert_eq!(
            board.sound_content(TabId::new(0), &id).await.unwrap(),
            Some(wav(b"q"))
        );

        board.remove_sound(TabId::new(0), &id).await.unwrap();
        assert!(board.transient.is_empty());
    }

    #[tokio::test]
    async fn offline_store_leaves_workspace_unchanged() {
        let (mut board, store, _) = board().await;
        let before = board.workspace().clone();
        store.set_offline(true);

        let err = board
            .add_sound(TabId::new(0), wav(b"x"), "x.wav", false)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::Store(sb_store::StoreError::Unavailable(_))));
        assert_eq!(board.workspace(), &before);
    }

    #[tokio::test]
    async fn failed_snapshot_write_rolls_back_and_discards_blob() {
        let (mut board, store, slot) = board().await;
        let before = board.workspace().clone();
        slot.failing.store(true, Ordering::SeqCst);

        assert!(board.add_sound(TabId::new(0), wav(b"x"), "x", false).await.is_err());
        assert_eq!(board.workspace(), &before);
        assert!(store.is_empty());

        assert!(board.create_tab("Other").is_err());
        assert_eq!(board.workspace(), &before);
    }

    #[tokio::test]
    async fn unknown_tab_is_not_found() {
        let (mut board, store, _) = board().await;
        let err = board.add_sound(TabId::new(9), wav(b"x"), "x", false).await.unwrap_err();
        assert!(matches!(err, BoardError::NotFound(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn last_tab_removal_is_invalid() {
        let (mut board, _, _) = board().await;
        let err = board.remove_tab(TabId::new(0)).await.unwrap_err();
        assert!(matches!(err, BoardError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn removing_tab_collects_unshared_blobs() {
        let (mut board, store, _) = board().await;
        let tab = board.create_tab("Drums").unwrap();
        board.add_sound(tab, wav(b"a"), "a", false).await.unwrap();
        let key = StorageKey::issue(0);

        // still in the library, so the tab removal keeps it
        assert!(board.remove_tab(tab).await.unwrap().is_empty());
        assert!(store.contains(&key).await.unwrap());

        let deletion = board.delete_library_entry(&key).await.unwrap();
        assert!(deletion.references.is_empty());
        assert!(deletion.blob_removed);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn library_deletion_defers_to_placed_sounds() {
        let (mut board, store, _) = board().await;
        let id = board.add_sound(TabId::new(0), wav(b"a"), "a", false).await.unwrap();
        let key = StorageKey::issue(0);

        let deletion = board.delete_library_entry(&key).await.unwrap();
        assert_eq!(deletion.references, vec![(TabId::new(0), id.clone())]);
        assert!(!deletion.blob_removed);
        assert!(store.contains(&key).await.unwrap());

        let collected = board.remove_sound(TabId::new(0), &id).await.unwrap();
        assert_eq!(collected, vec![key]);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn non_audio_source_is_rejected() {
        struct TextSource;

        #[async_trait::async_trait]
        impl SoundSource for TextSource {
            async fn fetch(&self, _locator: &str) -> BoardResult<Blob> {
                Ok(Blob::new("text/plain", b"hello".to_vec()))
            }
        }

        let (mut board, store, _) = board().await;
        let err = board
            .add_sound_from_source(TabId::new(0), &TextSource, "notes.txt", false)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::SourceFetchFailed(_)));
        assert!(store.is_empty());
        assert!(board.list_tabs()[0].sounds.is_empty());
    }

    #[tokio::test]
    async fn source_name_comes_from_locator() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snare.ogg");
        std::fs::write(&path, b"OggS").unwrap();

        let (mut board, _, _) = board().await;
        let id = board
            .add_sound_from_source(TabId::new(0), &crate::FileSource, path.to_str().unwrap(), false)
            .await
            .unwrap();
        let sound = board.workspace().sound(TabId::new(0), &id).unwrap();
        assert_eq!(sound.display_name, "snare.ogg");
    }

    #[tokio::test]
    async fn sweep_collects_orphans() {
        let (mut board, store, _) = board().await;
        board.add_sound(TabId::new(0), wav(b"keep"), "keep", false).await.unwrap();
        store.put(&StorageKey::issue(40), &wav(b"orphan")).await.unwrap();

        let swept = board.sweep().await.unwrap();
        assert_eq!(swept, vec![StorageKey::issue(40)]);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn corrupt_snapshot_starts_fresh() {
        let store = Arc::new(InMemoryBlobStore::new());
        let slot = Arc::new(InMemorySlot::with_document("{ definitely not json"));
        let (board, report) = Board::with_stores(store, slot, "Main").await.unwrap();

        assert!(matches!(report.notices.as_slice(), [Notice::SnapshotCorrupt { .. }]));
        assert_eq!(board.list_tabs().len(), 1);
    }

    #[tokio::test]
    async fn mutations_persist_across_reload() {
        let (mut board, store, slot) = board().await;
        let id = board.add_sound(TabId::new(0), wav(b"a"), "a", false).await.unwrap();
        board.set_sound_volume(TabId::new(0), &id, 0.3).unwrap();
        board.toggle_loop(TabId::new(0), &id).unwrap();
        board.set_master_volume(0.5).unwrap();
        let tab = board.create_tab("Second").unwrap();
        board.close();

        let (reloaded, report) = Board::with_stores(store, slot, "Main").await.unwrap();
        assert!(report.is_clean());
        assert_eq!(reloaded.active_tab(), tab);
        assert_eq!(reloaded.workspace().master_volume(), 0.5);
        let sound = reloaded.workspace().sound(TabId::new(0), &id).unwrap();
        assert_eq!(sound.volume, 0.3);
        assert!(sound.looping);
    }

    #[tokio::test]
    async fn library_entry_without_blob_cannot_be_placed() {
        let store = Arc::new(InMemoryBlobStore::new());
        let slot = Arc::new(InMemorySlot::with_document(
            r#"{"nextTabId": 1, "nextLibrarySeq": 1,
                "tabs": [{"id": 0, "name": "Main", "sounds": []}],
                "library": [{"id": "file-0", "name": "kick"}]}"#,
        ));
        let (mut board, _) = Board::with_stores(store.clone(), slot, "Main").await.unwrap();
        let key = StorageKey::issue(0);
        assert_eq!(board.list_library().len(), 1);
        let before = board.workspace().clone();

        let err = board.add_from_library(TabId::new(0), &key).await.unwrap_err();
        assert!(matches!(err, BoardError::NotFound(_)));
        assert_eq!(board.workspace(), &before);

        store.put(&key, &wav(b"kick")).await.unwrap();
        let id = board.add_from_library(TabId::new(0), &key).await.unwrap();
        assert_eq!(board.library_references(&key), vec![(TabId::new(0), id)]);
    }

    #[tokio::test]
    async fn spent_tab_counter_fails_instead_of_wrapping() {
        let store = Arc::new(InMemoryBlobStore::new());
        let slot = Arc::new(InMemorySlot::with_document(
            r#"{"nextTabId": 18446744073709551615,
                "tabs": [{"id": 0, "name": "Main", "sounds": []}]}"#,
        ));
        let (mut board, report) = Board::with_stores(store, slot, "Main").await.unwrap();
        assert!(report.is_clean());
        let before = board.workspace().clone();

        let err = board.create_tab("Another").unwrap_err();
        assert!(matches!(err, BoardError::InvalidOperation(_)));
        assert_eq!(board.workspace(), &before);
    }

    #[tokio::test]
    async fn import_with_largest_key_loads_and_refuses_new_keys() {
        let (mut board, store, _) = board().await;
        let doc = r#"{
            "state": {"nextTabId": 1, "nextSoundSeq": 1,
                "tabs": [{"id": 0, "name": "Main", "sounds": [
                    {"id": "sound-0", "name": "last", "storageKey": "file-18446744073709551615"}
                ]}],
                "library": [{"id": "file-18446744073709551615", "name": "last"}]},
            "files": {"file-18446744073709551615":
                {"name": "last", "inlineContent": "data:audio/wav;base64,a2ljaw=="}}
        }"#;
        let (imported, report) = board.import_json(doc).await.unwrap();
        assert_eq!(imported.restored.len(), 1);
        assert!(report.is_clean());
        assert_eq!(board.list_tabs()[0].sounds.len(), 1);

        let err = board
            .add_sound(TabId::new(0), wav(b"x"), "x", false)
            .await
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidOperation(_)));
        assert_eq!(store.len(), 1);
        assert_eq!(board.list_tabs()[0].sounds.len(), 1);
    }

    #[tokio::test]
    async fn import_failing_after_clear_resets_workspace() {
        let (mut board, store, slot) = board().await;
        board.add_sound(TabId::new(0), wav(b"old"), "old", false).await.unwrap();
        board.add_sound(TabId::new(0), wav(b"q"), "quick", true).await.unwrap();
        let doc = board.export_all().await.unwrap();

        slot.failing.store(true, Ordering::SeqCst);
        let err = board.import_all(&doc).await.unwrap_err();
        assert!(matches!(err, BoardError::Store(_)));
        assert_eq!(board.workspace(), &Workspace::new("Main"));
        assert!(board.transient.is_empty());
        // the store already holds the imported files
        assert_eq!(store.len(), 1);
    }
}
