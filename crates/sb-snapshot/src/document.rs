//! The persisted snapshot document.
//!
//! ```text
//! { masterVolume, nextTabId, nextSoundSeq, nextLibrarySeq, activeTabId,
//!   tabs: [ { id, name, sounds: [ { id, name, storageKey, volume, looping } ] } ],
//!   library: [ { id, name } ] }
//! ```
//!
//! Documents written by the earlier program use `tabCounter`, `soundCounter`,
//! `libraryCounter`, `currentTab`, `fileKey` and `isLooping`; those spellings
//! are accepted on read. Its oldest form carried content inline as `dataUrl`
//! instead of a key; see [`crate::legacy`].

use sb_types::{SoundId, StorageKey, TabId};
use serde::{Deserialize, Serialize};

use crate::error::{SnapshotError, SnapshotResult};

fn full_volume() -> f64 {
    1.0
}

/// Structural state of a workspace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default = "full_volume")]
    pub master_volume: f64,
    #[serde(default, alias = "tabCounter")]
    pub next_tab_id: u64,
    #[serde(default, alias = "soundCounter")]
    pub next_sound_seq: u64,
    #[serde(default, alias = "libraryCounter")]
    pub next_library_seq: u64,
    #[serde(default, alias = "currentTab")]
    pub active_tab_id: TabId,
    #[serde(default)]
    pub tabs: Vec<TabRecord>,
    #[serde(default)]
    pub library: Vec<LibraryRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TabRecord {
    pub id: TabId,
    pub name: String,
    #[serde(default)]
    pub sounds: Vec<SoundRecord>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoundRecord {
    pub id: SoundId,
    pub name: String,
    #[serde(default, alias = "fileKey")]
    pub storage_key: Option<StorageKey>,
    #[serde(default = "full_volume")]
    pub volume: f64,
    #[serde(default, alias = "isLooping")]
    pub looping: bool,
    /// Legacy inline content (a data URL). Never written by [`crate::encode`].
    #[serde(default, alias = "dataUrl", skip_serializing_if = "Option::is_none")]
    pub inline_content: Option<String>,
}

/// A library entry; `id` is the storage key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRecord {
    pub id: StorageKey,
    pub name: String,
}

impl Snapshot {
    /// Parse a stored document.
    pub fn from_json(document: &str) -> SnapshotResult<Self> {
        serde_json::from_str(document).map_err(|e| SnapshotError::Corrupt(e.to_string()))
    }

    /// Parse an already-decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> SnapshotResult<Self> {
        serde_json::from_value(value).map_err(|e| SnapshotError::Corrupt(e.to_string()))
    }

    pub fn to_json(&self) -> String {
        // A Snapshot has string keys and finite-or-null numbers only.
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// All sound records with their tab id.
    pub fn sounds(&self) -> impl Iterator<Item = (TabId, &SoundRecord)> {
        self.tabs
            .iter()
            .flat_map(|t| t.sounds.iter().map(move |s| (t.id, s)))
    }

    /// One past the highest issued `file-N` sequence referenced anywhere in
    /// the document, or the stored counter if that is higher. Saturates at
    /// `u64::MAX`.
    pub fn library_seq_floor(&self) -> u64 {
        let keys = self
            .sounds()
            .filter_map(|(_, s)| s.storage_key.as_ref())
            .chain(self.library.iter().map(|e| &e.id));
        keys.filter_map(StorageKey::seq)
            .map(|seq| seq.saturating_add(1))
            .fold(self.next_library_seq, u64::max)
    }
}
