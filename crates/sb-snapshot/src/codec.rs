use sb_store::BlobStore;
use sb_types::{
    Counters, LibraryEntry, Sound, SoundId, StorageKey, Tab, TabId, Workspace, WorkspaceParts,
};
use tracing::{debug, warn};

use crate::document::{LibraryRecord, Snapshot, SoundRecord, TabRecord};
use crate::error::SnapshotResult;

/// A sound left out of a decoded workspace because its content is gone.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DroppedSound {
    pub tab: TabId,
    pub sound: SoundId,
    /// `None` when the record never had a key (an unmigrated inline sound).
    pub key: Option<StorageKey>,
}

/// Result of [`decode`].
#[derive(Clone, Debug)]
pub struct Decoded {
    pub workspace: Workspace,
    pub dropped: Vec<DroppedSound>,
}

/// Serialize the structural state of `ws`. Ephemeral sounds are omitted.
pub fn encode(ws: &Workspace) -> Snapshot {
    let counters = ws.counters();
    let tabs = ws
        .tabs()
        .iter()
        .map(|tab| TabRecord {
            id: tab.id,
            name: tab.name.clone(),
            sounds: tab
                .sounds
                .iter()
                .filter_map(|s| {
                    let key = s.persisted_key()?;
                    Some(SoundRecord {
                        id: s.id.clone(),
                        name: s.display_name.clone(),
                        storage_key: Some(key.clone()),
                        volume: s.volume,
                        looping: s.looping,
                        inline_content: None,
                    })
                })
                .collect(),
        })
        .collect();

    let library = ws
        .library()
        .iter()
        .map(|e| LibraryRecord {
            id: e.key.clone(),
            name: e.display_name.clone(),
        })
        .collect();

    Snapshot {
        master_volume: ws.master_volume(),
        next_tab_id: counters.next_tab_id,
        next_sound_seq: counters.next_sound_seq,
        next_library_seq: counters.next_library_seq,
        active_tab_id: ws.active_tab(),
        tabs,
        library,
    }
}

/// Rebuild a workspace from `snapshot`.
///
/// Each sound's key is looked up in `store`; a sound whose blob is absent is
/// dropped and reported rather than failing the load. Library entries load
/// unconditionally. Store errors other than absence propagate, so an
/// unreachable store never causes sounds to be dropped.
pub async fn decode(snapshot: &Snapshot, store: &dyn BlobStore) -> SnapshotResult<Decoded> {
    let mut dropped = Vec::new();
    let mut tabs = Vec::with_capacity(snapshot.tabs.len());

    for record in &snapshot.tabs {
        let mut tab = Tab::new(record.id, record.name.clone());
        for s in &record.sounds {
            let Some(key) = s.storage_key.clone() else {
                warn!(tab = %record.id, sound = %s.id, "sound has no storage key; dropping");
                dropped.push(DroppedSound {
                    tab: record.id,
                    sound: s.id.clone(),
                    key: None,
                });
                continue;
            };
            if !store.contains(&key).await? {
                warn!(tab = %record.id, sound = %s.id, %key, "blob missing; dropping sound");
                dropped.push(DroppedSound {
                    tab: record.id,
                    sound: s.id.clone(),
                    key: Some(key),
                });
                continue;
            }
            tab.sounds.push(
                Sound::persistent(s.id.clone(), s.name.clone(), key)
                    .with_volume(s.volume)
                    .with_looping(s.looping),
            );
        }
        tabs.push(tab);
    }

    let library = snapshot
        .library
        .iter()
        .map(|e| LibraryEntry::new(e.id.clone(), e.name.clone()))
        .collect();

    let workspace = Workspace::from_parts(WorkspaceParts {
        tabs,
        library,
        active_tab: Some(snapshot.active_tab_id),
        master_volume: snapshot.master_volume,
        counters: Counters {
            next_tab_id: snapshot.next_tab_id,
            next_sound_seq: snapshot.next_sound_seq,
            next_library_seq: snapshot.next_library_seq,
        },
    });
    debug!(
        tabs = workspace.tabs().len(),
        library = workspace.library().len(),
        dropped = dropped.len(),
        "snapshot decoded"
    );
    Ok(Decoded { workspace, dropped })
}
