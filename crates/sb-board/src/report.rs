use sb_types::{SoundId, StorageKey, TabId};

/// Something the user should hear about after a load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    /// The stored snapshot could not be parsed; a fresh workspace was used.
    SnapshotCorrupt { reason: String },
    /// A sound's content was gone, so the sound was dropped.
    BlobMissing {
        tab: TabId,
        sound: SoundId,
        key: Option<StorageKey>,
    },
    /// Inline content of this many sounds moved to the blob store.
    Migrated { sounds: usize },
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SnapshotCorrupt { reason } => {
                write!(f, "saved board was unreadable and has been reset ({reason})")
            }
            Self::BlobMissing { tab, sound, key: Some(key) } => {
                write!(f, "sound {sound} in tab {tab} lost its content ({key})")
            }
            Self::BlobMissing { tab, sound, key: None } => {
                write!(f, "sound {sound} in tab {tab} had no stored content")
            }
            Self::Migrated { sounds } => write!(f, "upgraded {sounds} sound(s) to file storage"),
        }
    }
}

/// Outcome of loading a board.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub notices: Vec<Notice>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.notices.is_empty()
    }

    pub fn dropped(&self) -> usize {
        self.notices
            .iter()
            .filter(|n| matches!(n, Notice::BlobMissing { .. }))
            .count()
    }
}

/// Outcome of deleting a library entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LibraryDeletion {
    /// Sounds still placing the key. They keep playing its content.
    pub references: Vec<(TabId, SoundId)>,
    /// Whether the content itself was deleted.
    pub blob_removed: bool,
}
